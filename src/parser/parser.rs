use crate::lexer::scanner::Lexer;
use crate::lexer::token::TokenKind;

use super::ast::{Expr, LiteralValue, Program, Span, Stmt};

const ASSIGN_OPS: [&str; 8] = ["=", "+=", "-=", "*=", "/=", "%=", "&=", "|="];

/// Recursive-descent parser over a lazy token stream. Precedence is an
/// explicit cascade of mutually-recursive levels, loosest binding first.
pub struct Parser {
    stream: Lexer,
    pos: Span,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Parser {
            stream: Lexer::new(source),
            pos: Span { line: 0, column: 0 },
        }
    }

    pub fn parse_program(&mut self) -> Result<Program, String> {
        let mut statements = Vec::new();
        while !self.stream.eof()? {
            statements.push(self.parse_statement()?);
            if self.stream.next_if(";")? {
                continue;
            }
            if !self.stream.eof()? {
                let token = self.stream.next()?;
                return Err(format!("EOF or \";\" expected, found {}", token.describe()));
            }
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Stmt, String> {
        self.mark_position()?;
        let span = self.pos;

        if self.stream.next_if("break")? {
            return Ok(Stmt::Break { span });
        }
        if self.stream.next_if("continue")? {
            return Ok(Stmt::Continue { span });
        }
        if self.stream.next_if("return")? {
            let expr = self
                .parse_expression()
                .map_err(|e| self.chain("while parsing RETURN statement expression", e))?;
            return Ok(Stmt::Return { expr, span });
        }
        if self.stream.next_if("let")? {
            let token = self.stream.next()?;
            if token.kind != TokenKind::Identifier {
                return Err(format!(
                    "while parsing LET statement: expected IDENTIFIER, found {}",
                    token.describe()
                ));
            }
            let init = if self.stream.next_if("=")? {
                let expr = self
                    .parse_expression()
                    .map_err(|e| self.chain("while parsing LET statement", e))?;
                Some(expr)
            } else {
                None
            };
            return Ok(Stmt::Let {
                name: token.literal,
                init,
                span,
            });
        }
        if self.stream.next_if("for")? {
            let cond = self
                .parse_expression()
                .map_err(|e| self.chain("while parsing FOR statement condition", e))?;
            let body = self
                .parse_statement_list()
                .map_err(|e| self.chain("while parsing FOR statement body", e))?;
            return Ok(Stmt::For { cond, body, span });
        }
        if self.stream.next_if("if")? {
            let cond = self
                .parse_expression()
                .map_err(|e| self.chain("while parsing IF statement condition", e))?;
            let then_branch = self
                .parse_statement_list()
                .map_err(|e| self.chain("while parsing IF statement THEN branch", e))?;
            let else_branch = if self.stream.next_if("else")? {
                let statements = self
                    .parse_statement_list()
                    .map_err(|e| self.chain("while parsing IF statement ELSE branch", e))?;
                Some(statements)
            } else {
                None
            };
            return Ok(Stmt::If {
                cond,
                then_branch,
                else_branch,
                span,
            });
        }
        if self.stream.next_if("say")? {
            let expr = self
                .parse_expression()
                .map_err(|e| self.chain("while parsing SAY statement", e))?;
            return Ok(Stmt::Say { expr, span });
        }

        let expr = self
            .parse_expression()
            .map_err(|e| self.chain("while parsing EXPRESSION statement", e))?;
        Ok(Stmt::Expr { expr, span })
    }

    /// Brace-delimited statement list. Statements are `;`-separated; a
    /// trailing `;` before the closing brace is allowed.
    fn parse_statement_list(&mut self) -> Result<Vec<Stmt>, String> {
        let open = self.stream.next()?;
        if !(open.kind == TokenKind::Punct && open.literal == "{") {
            return Err(format!(
                "expected \"{{\" while parsing statement list, found {}",
                open.describe()
            ));
        }
        let mut statements = Vec::new();
        if self.stream.next_if("}")? {
            return Ok(statements);
        }
        loop {
            statements.push(self.parse_statement()?);
            if self.stream.next_if(";")? {
                if self.stream.next_if("}")? {
                    break;
                }
                continue;
            }
            let token = self.stream.next()?;
            if token.kind == TokenKind::Punct && token.literal == "}" {
                break;
            }
            return Err(format!(
                "closing \"}}\" or \";\" expected, found {}",
                token.describe()
            ));
        }
        Ok(statements)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, String> {
        self.parse_assign()
    }

    // Assignment is right-associative and its target must be a bare
    // identifier.
    fn parse_assign(&mut self) -> Result<Expr, String> {
        let left = self.parse_logical_or()?;
        if let Some(op) = self.peek_operator(&ASSIGN_OPS)? {
            let name = match left {
                Expr::Variable { name } => name,
                _ => {
                    return Err(format!(
                        "expected identifier in ASSIGN expression {}",
                        self.pos
                    ))
                }
            };
            self.stream.next()?;
            let value = self.parse_assign()?;
            return Ok(Expr::Assign {
                op,
                name,
                value: Box::new(value),
            });
        }
        Ok(left)
    }

    fn parse_logical_or(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(&["|"], Self::parse_logical_and)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(&["&"], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(&["==", "!="], Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(&[">", "<", ">=", "<="], Self::parse_term)
    }

    fn parse_term(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(&["+", "-"], Self::parse_factor)
    }

    fn parse_factor(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(&["*", "/", "%"], Self::parse_unary)
    }

    fn parse_binary_level(
        &mut self,
        ops: &[&str],
        next: fn(&mut Self) -> Result<Expr, String>,
    ) -> Result<Expr, String> {
        let mut left = next(self)?;
        while let Some(op) = self.peek_operator(ops)? {
            self.stream.next()?;
            let right = next(self)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        if let Some(op) = self.peek_operator(&["!", "-", "+"])? {
            self.stream.next()?;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        let value = self.parse_value()?;
        self.parse_postfix(value)
    }

    // Postfix `[index]` and `(args)` chain freely: `f(1)(2)[0]`.
    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, String> {
        loop {
            if self.stream.next_if("[")? {
                let index = self.parse_expression()?;
                self.expect("]", "expected closing \"]\"")?;
                expr = Expr::Index {
                    receiver: Box::new(expr),
                    index: Box::new(index),
                };
                continue;
            }
            if self.stream.next_if("(")? {
                let args = self.parse_expression_list(")")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
                continue;
            }
            return Ok(expr);
        }
    }

    fn parse_value(&mut self) -> Result<Expr, String> {
        if self.stream.next_if("(")? {
            let expr = self.parse_expression()?;
            self.expect(")", "expected closing \")\"")?;
            return Ok(expr);
        }
        if self.stream.next_if("[")? {
            let elements = self.parse_expression_list("]")?;
            return Ok(Expr::Array { elements });
        }
        if self.stream.next_if("fn")? {
            let name = if self.stream.peek()?.kind == TokenKind::Identifier {
                Some(self.stream.next()?.literal)
            } else {
                None
            };
            self.expect(":", "\":\" expected after \"fn\"")?;
            let params = self.parse_param_list("{")?;
            let body = self.parse_statement_list()?;
            return Ok(Expr::Function { name, params, body });
        }
        if self.stream.next_if("lambda")? {
            let params = self.parse_param_list(":")?;
            self.expect(":", "\":\" expected after lambda parameters")?;
            let expr = self.parse_expression()?;
            let body = vec![Stmt::Return {
                expr,
                span: self.pos,
            }];
            return Ok(Expr::Function {
                name: None,
                params,
                body,
            });
        }

        let token = self.stream.next()?;
        match token.kind {
            TokenKind::Identifier => Ok(Expr::Variable {
                name: token.literal,
            }),
            TokenKind::Int => {
                let value = token
                    .literal
                    .parse::<i64>()
                    .map_err(|_| format!("failed to parse {} to INT", token.describe()))?;
                Ok(Expr::Literal {
                    value: LiteralValue::Int(value),
                })
            }
            TokenKind::Float => {
                let value = token
                    .literal
                    .parse::<f64>()
                    .map_err(|_| format!("failed to parse {} to FLOAT", token.describe()))?;
                Ok(Expr::Literal {
                    value: LiteralValue::Float(value),
                })
            }
            TokenKind::Str => Ok(Expr::Literal {
                value: LiteralValue::Str(token.literal),
            }),
            TokenKind::Bool => Ok(Expr::Literal {
                value: LiteralValue::Bool(token.literal == "true"),
            }),
            TokenKind::Null => Ok(Expr::Null),
            _ => Err(format!("unexpected {}", token.describe())),
        }
    }

    /// `end`-terminated, comma-separated expression list. The terminator is
    /// consumed; a trailing comma is tolerated.
    fn parse_expression_list(&mut self, end: &str) -> Result<Vec<Expr>, String> {
        let mut items = Vec::new();
        if self.stream.next_if(end)? {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            if self.stream.next_if(",")? {
                if self.stream.next_if(end)? {
                    break;
                }
                continue;
            }
            let token = self.stream.next()?;
            if token.kind == TokenKind::Punct && token.literal == end {
                break;
            }
            return Err(format!(
                "expected closing \"{end}\" or \",\", found {}",
                token.describe()
            ));
        }
        Ok(items)
    }

    /// Comma-separated identifiers, terminated by `end`. The terminator is
    /// left for the caller to consume.
    fn parse_param_list(&mut self, end: &str) -> Result<Vec<String>, String> {
        let mut params = Vec::new();
        if self.peek_is(end)? {
            return Ok(params);
        }
        loop {
            let token = self.stream.next()?;
            if token.kind != TokenKind::Identifier {
                return Err(format!("identifier expected, found {}", token.describe()));
            }
            params.push(token.literal);
            if self.stream.next_if(",")? {
                if self.peek_is(end)? {
                    break;
                }
                continue;
            }
            if !self.peek_is(end)? {
                return Err(format!(
                    "expected closing \"{end}\" or \",\", found {}",
                    self.stream.peek()?.describe()
                ));
            }
            break;
        }
        Ok(params)
    }

    fn peek_operator(&mut self, ops: &[&str]) -> Result<Option<String>, String> {
        let token = self.stream.peek()?;
        if token.kind == TokenKind::Op && ops.contains(&token.literal.as_str()) {
            return Ok(Some(token.literal.clone()));
        }
        Ok(None)
    }

    fn peek_is(&mut self, literal: &str) -> Result<bool, String> {
        let token = self.stream.peek()?;
        Ok(token.kind != TokenKind::Str
            && token.kind != TokenKind::Illegal
            && token.literal == literal)
    }

    fn expect(&mut self, literal: &str, info: &str) -> Result<(), String> {
        let token = self.stream.next()?;
        if token.kind != TokenKind::Str
            && token.kind != TokenKind::Illegal
            && token.literal == literal
        {
            return Ok(());
        }
        Err(format!("{info}, found {}", token.describe()))
    }

    fn mark_position(&mut self) -> Result<(), String> {
        let token = self.stream.peek()?;
        self.pos = Span {
            line: token.line,
            column: token.column,
        };
        Ok(())
    }

    fn chain(&self, info: &str, inner: String) -> String {
        format!("{}: {},\n{}", info, self.pos, inner)
    }
}

//! Evaluator: substitutes placeholders depth-first against a data context

use super::pipeline::apply_filters;
use super::registry::FilterRegistry;
use super::resolver::{lookup, resolve};
use crate::error::RenderError;
use crate::parser::ast::{find_placeholder, Directive, Token, TokenTable};
use crate::value::Context;

/// Evaluates flattened text produced by the marker and block passes
///
/// Borrows the token table of one render call, so evaluators for different
/// calls never share state.
pub struct Evaluator<'a> {
    tokens: &'a TokenTable,
    filters: &'a FilterRegistry,
    debug: bool,
}

impl<'a> Evaluator<'a> {
    pub fn new(tokens: &'a TokenTable, filters: &'a FilterRegistry, debug: bool) -> Self {
        Self {
            tokens,
            filters,
            debug,
        }
    }

    /// Replace every placeholder in `text`, left to right
    pub fn render(&self, text: &str, ctx: &mut Context) -> Result<String, RenderError> {
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;

        while let Some((start, end, id)) = find_placeholder(text, cursor) {
            out.push_str(&text[cursor..start]);
            match self.tokens.get(id) {
                Some(token) => out.push_str(&self.render_token(id, token, ctx)?),
                None => out.push_str(&text[start..end]),
            }
            cursor = end;
        }

        out.push_str(&text[cursor..]);
        Ok(out)
    }

    fn render_token(&self, id: usize, token: &Token, ctx: &mut Context) -> Result<String, RenderError> {
        match token {
            Token::Variable { buffer, filters } => {
                tracing::trace!(id, expr = %buffer, "variable");
                let value = resolve(ctx, buffer);
                let value = apply_filters(ctx, self.filters, value, filters)?;
                Ok(value.to_string())
            }
            Token::Literal { buffer } => Ok(buffer.clone()),
            Token::Directive { directive, .. } => {
                tracing::trace!(id, ?directive, "directive");
                self.render_directive(directive, ctx)
            }
        }
    }

    fn render_directive(&self, directive: &Directive, ctx: &mut Context) -> Result<String, RenderError> {
        match directive {
            Directive::If {
                cond,
                then_body,
                else_body,
            } => {
                if resolve(ctx, cond).is_truthy() {
                    self.render(then_body, ctx)
                } else {
                    self.render_else(else_body.as_deref(), ctx)
                }
            }
            Directive::For {
                key,
                elem,
                list,
                body,
                else_body,
            } => self.render_loop(key.as_deref(), elem, list, body, else_body.as_deref(), ctx),
            Directive::Set { name, value } => {
                let value = resolve(ctx, value);
                ctx.set(name.as_str(), value);
                Ok(String::new())
            }
            Directive::SetBlock { name, body } => {
                let text = self.render(body, ctx)?;
                ctx.set(name.as_str(), text);
                Ok(String::new())
            }
        }
    }

    fn render_loop(
        &self,
        key: Option<&str>,
        elem: &str,
        list: &str,
        body: &str,
        else_body: Option<&str>,
        ctx: &mut Context,
    ) -> Result<String, RenderError> {
        let source = match lookup(ctx, list) {
            Some(value) if !value.is_null() => value,
            _ if self.debug => {
                return Err(RenderError::UndefinedList {
                    list: list.to_string(),
                })
            }
            _ => {
                tracing::debug!(list, "loop source is undefined");
                return self.render_else(else_body, ctx);
            }
        };

        if !source.has_elements() {
            return self.render_else(else_body, ctx);
        }

        let mut out = String::new();
        for (k, v) in source.entries() {
            let mut scope = ctx.derive();
            if let Some(key) = key {
                scope.set(key, k);
            }
            scope.set(elem, v);
            out.push_str(&self.render(body, &mut scope)?);
        }
        Ok(out)
    }

    fn render_else(&self, body: Option<&str>, ctx: &mut Context) -> Result<String, RenderError> {
        match body {
            Some(body) => self.render(body, ctx),
            None => Ok(String::new()),
        }
    }
}

/// Convenience for rendering flattened text with a fresh evaluator
pub fn evaluate(
    text: &str,
    tokens: &TokenTable,
    filters: &FilterRegistry,
    debug: bool,
    ctx: &mut Context,
) -> Result<String, RenderError> {
    Evaluator::new(tokens, filters, debug).render(text, ctx)
}

//! Record → token transformation.
//!
//! Records are processed strictly in order against one [`ResolveContext`]
//! built over the whole batch, so forward references resolve from memory.

use std::collections::HashMap;
use tracing::{debug, info};

use super::extract::extract;
use super::mapping::FieldMapping;
use super::resolve::ResolveContext;
use super::{color, infer, path};
use crate::model::{Record, Scalar, Token, TokenType, TokenValue};
use crate::source::DocumentSource;

/// Name used for records whose name field is empty.
pub const UNTITLED: &str = "Untitled";

/// Turns upstream records into tokens.
pub struct TokenTransformer<'a> {
    mapping: &'a FieldMapping,
}

impl<'a> TokenTransformer<'a> {
    #[must_use]
    pub const fn new(mapping: &'a FieldMapping) -> Self {
        Self { mapping }
    }

    /// Transform a batch, preserving input order.
    pub async fn transform<S: DocumentSource>(&self, records: &[Record], source: &S) -> Vec<Token> {
        let mut ctx = ResolveContext::new(records, self.mapping);
        let mut tokens = Vec::with_capacity(records.len());
        let mut declared = Vec::with_capacity(records.len());

        for record in records {
            let (token, has_declared_type) = self.transform_one(record, &mut ctx, source).await;
            debug!(id = %token.id, name = %token.full_name(), value = %token.value, "Transformed record");
            tokens.push(token);
            declared.push(has_declared_type);
        }

        adopt_target_types(&mut tokens, &declared);

        info!(
            records = records.len(),
            fetched = ctx.fetch_count(),
            "Transformed records into tokens"
        );
        tokens
    }

    async fn transform_one<S: DocumentSource>(
        &self,
        record: &Record,
        ctx: &mut ResolveContext<'_>,
        source: &S,
    ) -> (Token, bool) {
        let mapping = self.mapping;

        let name = path::normalize_name(&extract(record, &mapping.name));
        let name = if name.is_empty() {
            UNTITLED.to_string()
        } else {
            name
        };
        let group = path::normalize_path(&extract(record, &mapping.group));

        let value = normalize_value(ctx.resolve(record, source).await);

        let declared = TokenType::from_declared(&extract(record, &mapping.token_type));
        let token_type = declared.unwrap_or_else(|| {
            value
                .literal()
                .map_or(TokenType::String, infer::infer)
        });
        let value = type_literal(value, token_type);

        let description = compose_description(
            &extract(record, &mapping.description),
            &extract(record, &mapping.unit),
        );

        let token = Token {
            id: record.id.clone(),
            name,
            group,
            token_type,
            value,
            description,
        };
        (token, declared.is_some())
    }
}

/// Rewrite color-shaped literals to hex, whatever the declared type.
fn normalize_value(value: TokenValue) -> TokenValue {
    let normalize = |scalar: Scalar| match scalar {
        Scalar::Text(s) if color::looks_like_color(&s) => Scalar::Text(color::normalize(&s)),
        Scalar::Text(s) => Scalar::Text(s.trim().to_string()),
        other => other,
    };
    match value {
        TokenValue::Scalar(s) => TokenValue::Scalar(normalize(s)),
        TokenValue::AliasWithFallback { target, fallback } => TokenValue::AliasWithFallback {
            target,
            fallback: normalize(fallback),
        },
        alias @ TokenValue::Alias { .. } => alias,
    }
}

/// Store plain numbers and booleans natively; unit-suffixed text stays text.
fn type_literal(value: TokenValue, ty: TokenType) -> TokenValue {
    let convert = |scalar: Scalar| -> Scalar {
        let Scalar::Text(s) = &scalar else {
            return scalar;
        };
        let converted = match ty {
            TokenType::Number => s
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Scalar::Number),
            TokenType::Boolean => infer::parse_bool(s).map(Scalar::Boolean),
            TokenType::Color | TokenType::String => None,
        };
        converted.unwrap_or(scalar)
    };
    match value {
        TokenValue::Scalar(s) => TokenValue::Scalar(convert(s)),
        TokenValue::AliasWithFallback { target, fallback } => TokenValue::AliasWithFallback {
            target,
            fallback: convert(fallback),
        },
        alias @ TokenValue::Alias { .. } => alias,
    }
}

/// Bare aliases without a declared type take the type of their target.
fn adopt_target_types(tokens: &mut [Token], declared: &[bool]) {
    let types: HashMap<String, TokenType> = tokens
        .iter()
        .filter(|t| !matches!(t.value, TokenValue::Alias { .. }))
        .map(|t| (t.full_name(), t.token_type))
        .collect();

    for (token, has_declared) in tokens.iter_mut().zip(declared) {
        if *has_declared {
            continue;
        }
        if let TokenValue::Alias { target } = &token.value {
            if let Some(ty) = types.get(target) {
                token.token_type = *ty;
            }
        }
    }
}

/// `"<description> [<unit>]"`, `"[<unit>]"`, or the description alone.
fn compose_description(description: &str, unit: &str) -> Option<String> {
    let description = description.trim();
    let unit = unit.trim();
    let composed = match (description.is_empty(), unit.is_empty()) {
        (_, true) => description.to_string(),
        (true, false) => format!("[{unit}]"),
        (false, false) => format!("{description} [{unit}]"),
    };
    (!composed.is_empty()).then_some(composed)
}

//! Query-string rendering for the REST table interface.
//!
//! Filters render as `column=op.value`, ordering as `order=a.desc,b.asc`.
//! Every component is percent-encoded.

/// Comparison operator of a row filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-insensitive `LIKE`; `*` is the wildcard.
    Ilike,
    /// `IS` comparison, used for `null`, `true` and `false`.
    Is,
}

impl FilterOp {
    /// Operator keyword as it appears in the query string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Ilike => "ilike",
            Self::Is => "is",
        }
    }
}

/// A single `column=op.value` row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    #[must_use]
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.to_string(),
        }
    }

    fn render(&self) -> String {
        format!(
            "{}={}.{}",
            urlencoding::encode(&self.column),
            self.op.as_str(),
            urlencoding::encode(&self.value)
        )
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Everything that goes after the `?` of a table request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub select: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<(String, Order)>,
    pub limit: Option<usize>,
    pub on_conflict: Option<String>,
}

impl QueryParams {
    /// Whether any row filter is present.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Render the query string without the leading `?`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(self.filters.len() + 4);

        if let Some(select) = &self.select {
            parts.push(format!("select={}", urlencoding::encode(select)));
        }

        parts.extend(self.filters.iter().map(Filter::render));

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(column, direction)| format!("{column}.{}", direction.as_str()))
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("order={}", urlencoding::encode(&order)));
        }

        if let Some(limit) = self.limit {
            parts.push(format!("limit={limit}"));
        }

        if let Some(on_conflict) = &self.on_conflict {
            parts.push(format!("on_conflict={}", urlencoding::encode(on_conflict)));
        }

        parts.join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_params_render_nothing() {
        assert_eq!(QueryParams::default().render(), "");
        assert!(!QueryParams::default().has_filters());
    }

    #[test]
    fn test_filters_and_order() {
        let params = QueryParams {
            select: Some("*".to_string()),
            filters: vec![
                Filter::new("is_available", FilterOp::Eq, true),
                Filter::new("stock", FilterOp::Gt, 0),
            ],
            order: vec![
                ("is_bestseller".to_string(), Order::Desc),
                ("rating".to_string(), Order::Desc),
            ],
            limit: Some(20),
            on_conflict: None,
        };

        assert_eq!(
            params.render(),
            "select=%2A&is_available=eq.true&stock=gt.0&order=is_bestseller.desc%2Crating.desc&limit=20"
        );
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let params = QueryParams {
            filters: vec![Filter::new("email", FilterOp::Eq, "a+b@example.com")],
            ..QueryParams::default()
        };
        assert_eq!(params.render(), "email=eq.a%2Bb%40example.com");
    }

    #[test]
    fn test_ilike_and_is_null() {
        let params = QueryParams {
            filters: vec![
                Filter::new("title", FilterOp::Ilike, "*cold brew*"),
                Filter::new("user_id", FilterOp::Is, "null"),
            ],
            ..QueryParams::default()
        };
        assert_eq!(
            params.render(),
            "title=ilike.%2Acold%20brew%2A&user_id=is.null"
        );
    }

    #[test]
    fn test_embedded_select_and_on_conflict() {
        let params = QueryParams {
            select: Some("*,menu_items(name,price)".to_string()),
            on_conflict: Some("user_id,menu_item_id".to_string()),
            ..QueryParams::default()
        };
        assert_eq!(
            params.render(),
            "select=%2A%2Cmenu_items%28name%2Cprice%29&on_conflict=user_id%2Cmenu_item_id"
        );
    }
}

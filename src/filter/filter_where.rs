use super::types::SqlParam;

/// Accumulates WHERE conditions and their numbered bind parameters.
/// Column names come from the caller as `&'static str`; values only ever
/// reach the query as `$n` placeholders.
pub struct FilterWhere {
    conditions: Vec<String>,
    param_values: Vec<SqlParam>,
}

impl FilterWhere {
    pub fn new() -> Self {
        Self {
            conditions: vec![],
            param_values: vec![],
        }
    }

    /// Case-insensitive substring match
    pub fn contains(&mut self, column: &'static str, needle: &str) -> &mut Self {
        let pattern = format!("%{}%", escape_like(needle));
        let placeholder = self.param(SqlParam::Text(pattern));
        self.conditions.push(format!("\"{}\" ILIKE {}", column, placeholder));
        self
    }

    pub fn at_least(&mut self, column: &'static str, value: f64) -> &mut Self {
        let placeholder = self.param(SqlParam::Float(value));
        self.conditions.push(format!("\"{}\" >= {}", column, placeholder));
        self
    }

    pub fn at_most(&mut self, column: &'static str, value: f64) -> &mut Self {
        let placeholder = self.param(SqlParam::Float(value));
        self.conditions.push(format!("\"{}\" <= {}", column, placeholder));
        self
    }

    /// Registers a bind value without a condition (LIMIT/OFFSET)
    pub fn param(&mut self, value: SqlParam) -> String {
        self.param_values.push(value);
        format!("${}", self.param_values.len())
    }

    pub fn finish(self) -> (String, Vec<SqlParam>) {
        let where_clause = if self.conditions.is_empty() {
            "1=1".to_string()
        } else {
            self.conditions.join(" AND ")
        };
        (where_clause, self.param_values)
    }
}

impl Default for FilterWhere {
    fn default() -> Self {
        Self::new()
    }
}

/// Escapes LIKE metacharacters so user text matches literally
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let (clause, params) = FilterWhere::new().finish();
        assert_eq!(clause, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn numbers_placeholders_in_order() {
        let mut w = FilterWhere::new();
        w.contains("title", "dune").at_least("price", 10.0).at_most("price", 20.0);
        let (clause, params) = w.finish();
        assert_eq!(clause, "\"title\" ILIKE $1 AND \"price\" >= $2 AND \"price\" <= $3");
        assert_eq!(
            params,
            vec![SqlParam::Text("%dune%".to_string()), SqlParam::Float(10.0), SqlParam::Float(20.0)]
        );
    }

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("100%_off\\"), "100\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}

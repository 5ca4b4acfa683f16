/// Outcome of running one strategy ladder. Absence is a value here, not an
/// error: `value` is `None` when every rung came back empty.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue<T> {
    pub value: Option<T>,
    /// Position of the rung that produced `value`.
    pub strategy_used: Option<usize>,
}

impl<T> FieldValue<T> {
    pub fn found(value: T, rung: usize) -> Self {
        FieldValue {
            value: Some(value),
            strategy_used: Some(rung),
        }
    }

    pub fn absent() -> Self {
        FieldValue {
            value: None,
            strategy_used: None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }
}

impl<T> Default for FieldValue<T> {
    fn default() -> Self {
        FieldValue::absent()
    }
}

impl<T> FieldValue<Vec<T>> {
    pub fn into_vec(self) -> Vec<T> {
        self.value.unwrap_or_default()
    }
}

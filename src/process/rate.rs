// src/process/rate.rs

use crate::grid::Cell;

/// Percentage points → fraction (`"45"` → `0.45`).
///
/// Blank, non-numeric and non-finite cells yield `None` and are left alone;
/// the rate column is legitimately empty on some rows.
pub fn rescale_percentage(cell: &Cell) -> Option<f64> {
    let value = match cell.value() {
        Cell::Number(n) => n,
        Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then(|| value / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale() {
        assert_eq!(rescale_percentage(&Cell::text("45")), Some(0.45));
        assert_eq!(rescale_percentage(&Cell::text(" 12.5 ")), Some(0.125));
        assert_eq!(rescale_percentage(&Cell::Number(100.0)), Some(1.0));
        assert_eq!(rescale_percentage(&Cell::text("-5")), Some(-0.05));
    }

    #[test]
    fn test_non_numeric_is_a_no_op() {
        assert_eq!(rescale_percentage(&Cell::Empty), None);
        assert_eq!(rescale_percentage(&Cell::text("")), None);
        assert_eq!(rescale_percentage(&Cell::text("abc")), None);
        assert_eq!(rescale_percentage(&Cell::text("45%")), None);
        assert_eq!(rescale_percentage(&Cell::text("NaN")), None);
        assert_eq!(rescale_percentage(&Cell::Bool(true)), None);
    }

    #[test]
    fn test_formula_uses_cached_value() {
        let cell = Cell::Formula {
            source: "A1*2".into(),
            cached: Some(Box::new(Cell::Number(50.0))),
        };
        assert_eq!(rescale_percentage(&cell), Some(0.5));
    }
}

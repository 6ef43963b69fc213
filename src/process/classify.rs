// src/process/classify.rs

use serde::Serialize;

/// Carrier label and sub-line derived from a statement row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub carrier: String,
    /// `None` when only the carrier could be determined.
    pub sub_line: Option<String>,
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Classify a row from its product, business code, plan type and commission
/// action. Inputs are compared trimmed and case-insensitively; the first
/// matching rule wins.
pub fn classify(
    product: &str,
    business_code: &str,
    plan_type: &str,
    commission_action: &str,
) -> Classification {
    let product = normalize(product);
    let business_code = normalize(business_code);
    let plan_type = normalize(plan_type);

    let (carrier, sub_line) = match (product.as_str(), business_code.as_str(), plan_type.as_str()) {
        ("dental", _, _) => ("Humana Dental", Some("Dental")),
        ("vision", _, _) => ("Humana Vision", Some("Vision")),
        (_, "ms", _) => ("Humana Med Supp", Some("Med Supp")),
        (_, "ma", "pdp") => ("Humana PDP", Some("PDP")),
        (_, "pdp", _) => ("Humana PDP", Some("PDP")),
        (_, "ma", _) => ("Humana MAPD", Some("Med Adv")),
        _ => ("Humana", None),
    };

    let mut carrier = carrier.to_string();
    if commission_action.to_uppercase().contains("OVERRIDE") {
        carrier.push_str(" override");
    }

    Classification {
        carrier,
        sub_line: sub_line.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(carrier: &str, sub_line: Option<&str>) -> Classification {
        Classification {
            carrier: carrier.into(),
            sub_line: sub_line.map(Into::into),
        }
    }

    #[test]
    fn test_rules() {
        assert_eq!(classify("Dental", "", "", ""), c("Humana Dental", Some("Dental")));
        assert_eq!(classify(" VISION ", "", "", ""), c("Humana Vision", Some("Vision")));
        assert_eq!(classify("", "MS", "", ""), c("Humana Med Supp", Some("Med Supp")));
        assert_eq!(classify("", "ma", "PDP", ""), c("Humana PDP", Some("PDP")));
        assert_eq!(classify("", "pdp", "", ""), c("Humana PDP", Some("PDP")));
        assert_eq!(classify("", "ma", "hmo", ""), c("Humana MAPD", Some("Med Adv")));
        assert_eq!(classify("", "", "", ""), c("Humana", None));
        assert_eq!(classify("life", "xx", "pdp", ""), c("Humana", None));
    }

    #[test]
    fn test_priority() {
        // product beats business code
        assert_eq!(classify("dental", "ma", "", ""), c("Humana Dental", Some("Dental")));
        assert_eq!(classify("vision", "ms", "pdp", ""), c("Humana Vision", Some("Vision")));
        // med supp beats the plan type
        assert_eq!(classify("", "ms", "pdp", ""), c("Humana Med Supp", Some("Med Supp")));
    }

    #[test]
    fn test_override_suffix() {
        assert_eq!(
            classify("dental", "", "", "Override Adj").carrier,
            "Humana Dental override"
        );
        assert_eq!(classify("", "ma", "", "OVERRIDE").carrier, "Humana MAPD override");
        assert_eq!(classify("", "", "", "agent override").carrier, "Humana override");
        assert_eq!(classify("", "", "", "  new business ").carrier, "Humana");
    }

    #[test]
    fn test_total_and_deterministic() {
        let values = ["", "dental", "vision", "ms", "ma", "pdp", "x"];
        for p in values {
            for b in values {
                for t in values {
                    let first = classify(p, b, t, "");
                    assert!(!first.carrier.is_empty());
                    assert_eq!(first, classify(p, b, t, ""));
                }
            }
        }
    }
}

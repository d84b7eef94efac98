//! Field visibility for the loan application form.
//!
//! The form has two linked selects, `loan_type` and `loan_subtype`. Every
//! other group on the form is a pure function of those two values.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    /// Sofortkredit
    Immediate,
    /// Baudarlehen
    Building,
}

impl LoanType {
    /// Accepts both the form values and the German display names.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "immediate" | "Sofortkredit" => Some(LoanType::Immediate),
            "building" | "Baudarlehen" => Some(LoanType::Building),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoanType::Immediate => "immediate",
            LoanType::Building => "building",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LoanSubtype {
    Tilgung,
    Endfaellig,
    Annuitaet,
}

impl LoanSubtype {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "tilgung" => Some(LoanSubtype::Tilgung),
            "endfaellig" => Some(LoanSubtype::Endfaellig),
            "annuitaet" => Some(LoanSubtype::Annuitaet),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoanSubtype::Tilgung => "tilgung",
            LoanSubtype::Endfaellig => "endfaellig",
            LoanSubtype::Annuitaet => "annuitaet",
        }
    }

    /// Option text: the value with its first letter upper-cased.
    pub fn label(self) -> String {
        let value = self.as_str();
        let mut chars = value.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

const IMMEDIATE_SUBTYPES: &[LoanSubtype] = &[
    LoanSubtype::Tilgung,
    LoanSubtype::Endfaellig,
    LoanSubtype::Annuitaet,
];
const BUILDING_SUBTYPES: &[LoanSubtype] = &[LoanSubtype::Annuitaet];

pub fn allowed_subtypes(loan_type: Option<LoanType>) -> &'static [LoanSubtype] {
    match loan_type {
        Some(LoanType::Immediate) => IMMEDIATE_SUBTYPES,
        Some(LoanType::Building) => BUILDING_SUBTYPES,
        None => &[],
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubtypeOption {
    pub value: String,
    pub label: String,
}

pub fn subtype_options(loan_type: Option<LoanType>) -> Vec<SubtypeOption> {
    allowed_subtypes(loan_type)
        .iter()
        .map(|s| SubtypeOption {
            value: s.as_str().to_string(),
            label: s.label(),
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Visibility {
    pub show_repay: bool,
    pub show_term: bool,
}

pub fn compute_visibility(loan_type: Option<LoanType>, subtype: Option<LoanSubtype>) -> Visibility {
    let is_tilgung = subtype == Some(LoanSubtype::Tilgung);
    match loan_type {
        Some(LoanType::Immediate) => Visibility {
            show_repay: is_tilgung,
            show_term: !is_tilgung,
        },
        Some(LoanType::Building) => Visibility {
            show_repay: false,
            show_term: true,
        },
        None => Visibility::default(),
    }
}

/// Containers of the debt-service and collateral inputs, only relevant for
/// building loans.
pub const COLLATERAL_FIELD_IDS: &[&str] = &[
    "available_income",
    "total_debt_payments",
    "collateral_value",
    "total_outstanding_debt",
];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollateralState {
    pub visible: bool,
    pub required: bool,
    pub disabled: bool,
}

impl CollateralState {
    pub fn for_loan_type(loan_type: Option<LoanType>) -> Self {
        let building = loan_type == Some(LoanType::Building);
        Self {
            visible: building,
            required: building,
            disabled: !building,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoanFormProjection {
    pub loan_type: Option<LoanType>,
    pub subtype: Option<LoanSubtype>,
    pub visibility: Visibility,
    pub collateral: CollateralState,
}

impl LoanFormProjection {
    /// Term and repayment amount are mutually exclusive: whenever the repay
    /// group is shown the term input is disabled and emptied.
    pub fn term_disabled(&self) -> bool {
        self.visibility.show_repay
    }
}

/// Derive the full form state from the raw select values.
pub fn project(loan_type_raw: &str, subtype_raw: &str) -> LoanFormProjection {
    let loan_type = LoanType::parse(loan_type_raw);
    let subtype = LoanSubtype::parse(subtype_raw);
    LoanFormProjection {
        loan_type,
        subtype,
        visibility: compute_visibility(loan_type, subtype),
        collateral: CollateralState::for_loan_type(loan_type),
    }
}

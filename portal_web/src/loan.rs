use std::rc::Rc;

use portal_core::{
    project, subtype_options, LoanFormProjection, LoanType, PortalError, SubtypeOption,
    COLLATERAL_FIELD_IDS,
};
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement};

use crate::dom::{js_err, listen, log_error, set_shown, Scope};

pub struct LoanFormController {
    loan_type: HtmlSelectElement,
    subtype: HtmlSelectElement,
    repay_group: HtmlElement,
    term_group: HtmlElement,
    term_input: Option<HtmlInputElement>,
    collateral: Vec<HtmlElement>,
}

impl LoanFormController {
    pub fn attach(scope: &Scope) -> Result<Rc<Self>, PortalError> {
        let controller = Rc::new(Self {
            loan_type: scope.find("loan_type")?,
            subtype: scope.find("loan_subtype")?,
            repay_group: scope.find("repayAmountGroup")?,
            term_group: scope.find("termGroup")?,
            term_input: scope.find_opt("term_in_years"),
            collateral: COLLATERAL_FIELD_IDS
                .iter()
                .filter_map(|id| scope.find_opt::<HtmlElement>(id))
                .collect(),
        });

        let c = Rc::clone(&controller);
        listen(&controller.loan_type, "change", move |_| {
            if let Err(err) = c.on_loan_type_change() {
                log_error("loan type change", &err);
            }
        })?;
        let c = Rc::clone(&controller);
        listen(&controller.subtype, "change", move |_| {
            if let Err(err) = c.apply() {
                log_error("loan subtype change", &err);
            }
        })?;

        controller.apply()?;
        Ok(controller)
    }

    pub fn on_loan_type_change(&self) -> Result<LoanFormProjection, PortalError> {
        let options = subtype_options(LoanType::parse(&self.loan_type.value()));
        self.populate_subtypes(&options)?;
        set_shown(&self.repay_group, false)?;
        set_shown(&self.term_group, false)?;
        self.apply()
    }

    fn populate_subtypes(&self, options: &[SubtypeOption]) -> Result<(), PortalError> {
        self.subtype.set_inner_html("");
        for opt in options {
            let option =
                HtmlOptionElement::new_with_text_and_value(&opt.label, &opt.value).map_err(js_err)?;
            self.subtype.append_child(&option).map_err(js_err)?;
        }
        Ok(())
    }

    /// Project the current select values onto the dependent groups.
    pub fn apply(&self) -> Result<LoanFormProjection, PortalError> {
        let projection = project(&self.loan_type.value(), &self.subtype.value());

        set_shown(&self.repay_group, projection.visibility.show_repay)?;
        set_shown(&self.term_group, projection.visibility.show_term)?;

        if let Some(term) = &self.term_input {
            let disabled = projection.term_disabled();
            term.set_disabled(disabled);
            if disabled {
                term.set_value("");
            }
        }

        let collateral = projection.collateral;
        for container in &self.collateral {
            set_shown(container, collateral.visible)?;
            let input = container
                .query_selector("input")
                .map_err(js_err)?
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok());
            if let Some(input) = input {
                input.set_required(collateral.required);
                input.set_disabled(collateral.disabled);
            }
        }

        Ok(projection)
    }
}

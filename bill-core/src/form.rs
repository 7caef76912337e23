use serde::Serialize;

use crate::currency::CurrencyFormat;
use crate::error::{ExportError, ItemListError, SubmitError};
use crate::export::{DocumentRenderer, ExportPipeline, ExportedFile, FileSink, ShareTarget};
use crate::invoice::{build_invoice, Invoice};
use crate::item::{Item, ItemField, ItemId, ItemList};
use crate::total::compute_total;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Haptic {
    Light,
    Medium,
    Success,
    Error,
}

/// A blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: &'static str,
    pub message: String,
    pub is_error: bool,
}

impl Alert {
    fn info(title: &'static str, message: impl Into<String>) -> Self {
        Self {
            title,
            message: message.into(),
            is_error: false,
        }
    }

    fn error(title: &'static str, message: impl Into<String>) -> Self {
        Self {
            title,
            message: message.into(),
            is_error: true,
        }
    }
}

/// What the form needs from the screen it lives on.
pub trait FormSurface {
    fn alert(&self, alert: Alert);
    fn haptic(&self, pulse: Haptic);
    /// Scroll so the newest item row is visible.
    fn reveal_last_item(&self) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmitPhase {
    #[default]
    Idle,
    Validating,
    Generating,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub customer_name: String,
    pub items: Vec<Item>,
    pub total: f64,
    pub formatted_total: String,
    pub phase: SubmitPhase,
}

/// Screen state: customer name, item rows and the submit state machine.
///
/// Submitting goes `Idle -> Validating -> Generating -> Idle`; a failed
/// validation drops straight back to `Idle`. While `Generating`, further
/// submits are refused so only one export runs at a time.
#[derive(Debug, Default)]
pub struct BillForm {
    customer_name: String,
    items: ItemList,
    phase: SubmitPhase,
}

impl BillForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn set_customer_name(&mut self, name: impl Into<String>) {
        self.customer_name = name.into();
    }

    pub fn items(&self) -> &[Item] {
        self.items.items()
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    pub fn total(&self) -> f64 {
        compute_total(self.items.items())
    }

    pub fn view(&self, money: &CurrencyFormat) -> FormView {
        let total = self.total();
        FormView {
            customer_name: self.customer_name.clone(),
            items: self.items.items().to_vec(),
            total,
            formatted_total: money.format(total),
            phase: self.phase,
        }
    }

    pub fn add_item(&mut self, surface: &impl FormSurface) -> ItemId {
        let id = self.items.add_item();
        surface.reveal_last_item();
        surface.haptic(Haptic::Light);
        id
    }

    pub fn update_item(&mut self, id: ItemId, field: ItemField, value: impl Into<String>) -> bool {
        self.items.update_item(id, field, value)
    }

    pub fn remove_item(&mut self, id: ItemId, surface: &impl FormSurface) -> Result<Item, ItemListError> {
        match self.items.remove_item(id) {
            Ok(item) => {
                surface.haptic(Haptic::Medium);
                Ok(item)
            }
            Err(e @ ItemListError::LastItem) => {
                surface.alert(Alert::error("Cannot Remove", e.to_string()));
                Err(e)
            }
            Err(e) => {
                log::warn!("[form] remove_item: {e}");
                Err(e)
            }
        }
    }

    /// Validates the form and, when it is complete, moves to `Generating` and
    /// hands back the invoice to export. Validation problems are shown to the
    /// user and leave the form in `Idle`.
    pub fn begin_submit(&mut self, surface: &impl FormSurface) -> Result<Invoice, SubmitError> {
        if self.phase == SubmitPhase::Generating {
            log::info!("[form] submit ignored: export already in flight");
            return Err(SubmitError::InFlight);
        }

        self.phase = SubmitPhase::Validating;
        match build_invoice(&self.customer_name, self.items.items()) {
            Ok(invoice) => {
                self.phase = SubmitPhase::Generating;
                Ok(invoice)
            }
            Err(e) => {
                self.phase = SubmitPhase::Idle;
                surface.alert(Alert::error("Error", e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Reports the export result to the user and returns to `Idle`.
    pub fn finish_submit(
        &mut self,
        result: Result<ExportedFile, ExportError>,
        surface: &impl FormSurface,
    ) -> Result<ExportedFile, ExportError> {
        self.phase = SubmitPhase::Idle;
        match &result {
            Ok(_) => {
                surface.alert(Alert::info("Success", "PDF has been generated and saved."));
                surface.haptic(Haptic::Success);
            }
            Err(e) => {
                log::error!("[export] {e}");
                surface.alert(Alert::error("Error", "Failed to generate PDF."));
                surface.haptic(Haptic::Error);
            }
        }
        result
    }

    /// `begin_submit`, export, `finish_submit` in one go.
    pub fn submit<R, S, T>(
        &mut self,
        pipeline: &ExportPipeline<R, S, T>,
        surface: &impl FormSurface,
    ) -> Result<ExportedFile, SubmitError>
    where
        R: DocumentRenderer,
        S: FileSink,
        T: ShareTarget,
    {
        let invoice = self.begin_submit(surface)?;
        let result = pipeline.export(&invoice);
        Ok(self.finish_submit(result, surface)?)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::ValidationError;
    use crate::export::fakes::{pipeline, CallLog, FakeRenderer, FakeShare};
    use crate::export::DirectorySink;

    #[derive(Debug, Clone, PartialEq)]
    enum Signal {
        Alert(&'static str, String),
        Haptic(Haptic),
        Reveal,
    }

    #[derive(Default)]
    struct RecordingSurface {
        signals: RefCell<Vec<Signal>>,
    }

    impl RecordingSurface {
        fn take(&self) -> Vec<Signal> {
            std::mem::take(&mut *self.signals.borrow_mut())
        }
    }

    impl FormSurface for RecordingSurface {
        fn alert(&self, alert: Alert) {
            self.signals.borrow_mut().push(Signal::Alert(alert.title, alert.message));
        }

        fn haptic(&self, pulse: Haptic) {
            self.signals.borrow_mut().push(Signal::Haptic(pulse));
        }

        fn reveal_last_item(&self) {
            self.signals.borrow_mut().push(Signal::Reveal);
        }
    }

    fn filled_form(customer: &str) -> BillForm {
        let mut form = BillForm::new();
        form.set_customer_name(customer);
        let id = form.items()[0].id;
        form.update_item(id, ItemField::Name, "Fan");
        form.update_item(id, ItemField::Quantity, "2");
        form.update_item(id, ItemField::Price, "100");
        form
    }

    #[test]
    fn add_item_reveals_row_and_pulses() {
        let surface = RecordingSurface::default();
        let mut form = BillForm::new();
        form.add_item(&surface);
        assert_eq!(form.items().len(), 2);
        assert_eq!(surface.take(), vec![Signal::Reveal, Signal::Haptic(Haptic::Light)]);
    }

    #[test]
    fn removing_last_item_warns_and_keeps_state() {
        let surface = RecordingSurface::default();
        let mut form = BillForm::new();
        let id = form.items()[0].id;

        assert_eq!(form.remove_item(id, &surface), Err(ItemListError::LastItem));
        assert_eq!(form.items().len(), 1);
        assert_eq!(
            surface.take(),
            vec![Signal::Alert("Cannot Remove", "You must have at least one item.".into())]
        );
    }

    #[test]
    fn successful_removal_pulses_medium() {
        let surface = RecordingSurface::default();
        let mut form = BillForm::new();
        let id = form.add_item(&surface);
        surface.take();

        form.remove_item(id, &surface).unwrap();
        assert_eq!(surface.take(), vec![Signal::Haptic(Haptic::Medium)]);
    }

    #[test]
    fn live_total_tracks_edits() {
        let mut form = filled_form("Ali");
        assert_eq!(form.total(), 200.0);
        let id = form.items()[0].id;
        form.update_item(id, ItemField::Quantity, "");
        assert_eq!(form.total(), 0.0);

        let view = form.view(&CurrencyFormat::default());
        assert_eq!(view.formatted_total, "₹0.00");
        assert_eq!(view.phase, SubmitPhase::Idle);
    }

    #[test]
    fn missing_customer_is_rejected_with_alert() {
        let surface = RecordingSurface::default();
        let mut form = filled_form("  ");
        let err = form.begin_submit(&surface).unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(ValidationError::MissingCustomerName)));
        assert_eq!(form.phase(), SubmitPhase::Idle);
        assert_eq!(
            surface.take(),
            vec![Signal::Alert("Error", "Please enter customer name.".into())]
        );
    }

    #[test]
    fn no_valid_items_is_rejected_with_alert() {
        let surface = RecordingSurface::default();
        let mut form = BillForm::new();
        form.set_customer_name("Ali");
        let err = form.begin_submit(&surface).unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(ValidationError::NoValidItems)));
        assert_eq!(
            surface.take(),
            vec![Signal::Alert("Error", "Please add at least one valid item to the bill.".into())]
        );
    }

    #[test]
    fn second_submit_while_generating_is_refused() {
        let surface = RecordingSurface::default();
        let mut form = filled_form("Ali");

        form.begin_submit(&surface).unwrap();
        assert_eq!(form.phase(), SubmitPhase::Generating);
        assert!(matches!(form.begin_submit(&surface), Err(SubmitError::InFlight)));
        assert!(surface.take().is_empty());

        let _ = form.finish_submit(Err(ExportError::Share("x".into())), &surface);
        assert_eq!(form.phase(), SubmitPhase::Idle);
        assert!(form.begin_submit(&surface).is_ok());
    }

    #[test]
    fn successful_submit_notifies_and_returns_to_idle() {
        let surface = RecordingSurface::default();
        let mut form = filled_form("Ali");
        let (pipeline, log) = pipeline(false, false);

        let out = form.submit(&pipeline, &surface).unwrap();
        assert_eq!(out.mime, mime::APPLICATION_PDF);
        assert_eq!(log.borrow().len(), 3);
        assert_eq!(form.phase(), SubmitPhase::Idle);
        assert_eq!(
            surface.take(),
            vec![
                Signal::Alert("Success", "PDF has been generated and saved.".into()),
                Signal::Haptic(Haptic::Success),
            ]
        );
    }

    #[test]
    fn failed_export_notifies_and_keeps_form_usable() {
        let surface = RecordingSurface::default();
        let mut form = filled_form("Ali");
        let (pipeline, _log) = pipeline(true, false);

        let err = form.submit(&pipeline, &surface).unwrap_err();
        assert!(matches!(err, SubmitError::Export(ExportError::Render(_))));
        assert_eq!(form.phase(), SubmitPhase::Idle);
        assert_eq!(
            surface.take(),
            vec![
                Signal::Alert("Error", "Failed to generate PDF.".into()),
                Signal::Haptic(Haptic::Error),
            ]
        );
        assert_eq!(form.customer_name(), "Ali");
        assert_eq!(form.items()[0].name, "Fan");
    }

    #[test]
    fn unwritable_export_directory_is_reported_and_form_returns_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("bills");
        std::fs::write(&blocker, b"").unwrap();

        let log: CallLog = Rc::default();
        let pipeline = ExportPipeline::new(
            FakeRenderer {
                log: log.clone(),
                fail: false,
            },
            DirectorySink::new(&blocker),
            FakeShare {
                log: log.clone(),
                fail: false,
            },
        );
        let surface = RecordingSurface::default();
        let mut form = filled_form("Ali");

        let err = form.submit(&pipeline, &surface).unwrap_err();
        assert!(matches!(err, SubmitError::Export(ExportError::Write(_))));
        assert_eq!(form.phase(), SubmitPhase::Idle);
        assert!(log.borrow().iter().all(|call| !call.starts_with("share")));
        assert_eq!(
            surface.take(),
            vec![
                Signal::Alert("Error", "Failed to generate PDF.".into()),
                Signal::Haptic(Haptic::Error),
            ]
        );
        assert!(form.begin_submit(&surface).is_ok());
    }
}

//! Core of the FMU bill generator: the editable item list, the live total,
//! invoice assembly (HTML and PDF) and the export pipeline that hands the
//! finished PDF to a share surface.
//!
//! Nothing in here knows about Tauri; the shell in `src-tauri` owns a
//! [`BillForm`] and implements [`FormSurface`] and [`ShareTarget`] on top of
//! the platform.

pub mod currency;
pub mod error;
pub mod export;
pub mod form;
pub mod html;
pub mod invoice;
pub mod item;
pub mod pdf;
pub mod profile;
pub mod total;

pub use currency::{CurrencyFormat, Grouping};
pub use error::{ExportError, ItemListError, ProfileError, SubmitError, ValidationError};
pub use export::{DirectorySink, DocumentRenderer, ExportPipeline, ExportedFile, FileSink, ShareTarget};
pub use form::{Alert, BillForm, FormSurface, FormView, Haptic, SubmitPhase};
pub use invoice::{build_invoice, build_invoice_with, Invoice, InvoiceNumber, LineItem};
pub use item::{Item, ItemField, ItemId, ItemList};
pub use pdf::PrintPdfRenderer;
pub use profile::BusinessProfile;
pub use total::compute_total;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bill_core::export::{DirectorySink, ExportPipeline, ShareTarget};
use bill_core::form::{Alert, BillForm, FormSurface, FormView, Haptic};
use bill_core::invoice::build_invoice;
use bill_core::item::{ItemField, ItemId};
use bill_core::{html, profile, BusinessProfile, ExportError, PrintPdfRenderer};
use mime::Mime;
use tauri::{AppHandle, Emitter, Manager};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tauri_plugin_opener::OpenerExt;

#[derive(Default)]
struct FormState {
    form: Mutex<BillForm>,
}

impl FormState {
    /// Takes over a poisoned guard: the form is plain data, and a finished
    /// export must still move it out of `Generating`.
    fn lock(&self) -> MutexGuard<'_, BillForm> {
        self.form.lock().unwrap_or_else(|poisoned| {
            log::warn!("[form] lock was poisoned; continuing with the last state");
            PoisonError::into_inner(poisoned)
        })
    }
}

struct ProfileState(BusinessProfile);

/// Dialogs through the dialog plugin; haptics and scrolling are events the
/// webview acts on.
#[derive(Clone)]
struct AppSurface {
    app: AppHandle,
}

impl FormSurface for AppSurface {
    fn alert(&self, alert: Alert) {
        let kind = if alert.is_error {
            MessageDialogKind::Error
        } else {
            MessageDialogKind::Info
        };
        self.app
            .dialog()
            .message(alert.message)
            .title(alert.title)
            .kind(kind)
            .show(|_| {});
    }

    fn haptic(&self, pulse: Haptic) {
        if let Err(e) = self.app.emit("haptic", pulse) {
            log::warn!("[ui] haptic event failed: {e}");
        }
    }

    fn reveal_last_item(&self) {
        if let Err(e) = self.app.emit("reveal-last-item", ()) {
            log::warn!("[ui] reveal event failed: {e}");
        }
    }
}

/// Opens the exported file with the platform's default handler, where the
/// user can print or share it.
struct OpenerShare {
    app: AppHandle,
}

impl ShareTarget for OpenerShare {
    fn share(&self, path: &Path, mime: &Mime) -> Result<(), ExportError> {
        log::info!("[export] opening {} as {mime}", path.display());
        self.app
            .opener()
            .open_path(path.to_string_lossy().into_owned(), None::<&str>)
            .map_err(|e| ExportError::Share(e.to_string()))
    }
}

fn export_dir(app: &AppHandle) -> Result<PathBuf, ExportError> {
    match app.path().download_dir() {
        Ok(dir) => Ok(dir),
        Err(e) => {
            log::warn!("[export] no downloads directory ({e}); using the app cache");
            app.path()
                .app_cache_dir()
                .map(|dir| dir.join("bills"))
                .map_err(|e| ExportError::Write(e.to_string()))
        }
    }
}

fn form_view(form: &BillForm, profile: &BusinessProfile) -> FormView {
    form.view(&profile.currency)
}

#[tauri::command]
fn get_form(state: tauri::State<'_, FormState>, profile: tauri::State<'_, ProfileState>) -> Result<FormView, String> {
    let form = state.lock();
    Ok(form_view(&form, &profile.0))
}

#[tauri::command]
fn get_business_profile(profile: tauri::State<'_, ProfileState>) -> BusinessProfile {
    profile.0.clone()
}

#[tauri::command]
fn set_customer_name(
    state: tauri::State<'_, FormState>,
    profile: tauri::State<'_, ProfileState>,
    name: String,
) -> Result<FormView, String> {
    let mut form = state.lock();
    form.set_customer_name(name);
    Ok(form_view(&form, &profile.0))
}

#[tauri::command]
fn add_item(
    app: AppHandle,
    state: tauri::State<'_, FormState>,
    profile: tauri::State<'_, ProfileState>,
) -> Result<FormView, String> {
    let surface = AppSurface { app };
    let mut form = state.lock();
    form.add_item(&surface);
    Ok(form_view(&form, &profile.0))
}

#[tauri::command]
fn update_item(
    state: tauri::State<'_, FormState>,
    profile: tauri::State<'_, ProfileState>,
    id: ItemId,
    field: ItemField,
    value: String,
) -> Result<FormView, String> {
    let mut form = state.lock();
    if !form.update_item(id, field, value) {
        return Err(format!("No item with id {id}."));
    }
    Ok(form_view(&form, &profile.0))
}

#[tauri::command]
fn remove_item(
    app: AppHandle,
    state: tauri::State<'_, FormState>,
    profile: tauri::State<'_, ProfileState>,
    id: ItemId,
) -> Result<FormView, String> {
    let surface = AppSurface { app };
    let mut form = state.lock();
    form.remove_item(id, &surface).map_err(|e| e.to_string())?;
    Ok(form_view(&form, &profile.0))
}

/// Markup for the in-app preview. Does not touch the submit state.
#[tauri::command]
fn preview_invoice_html(
    state: tauri::State<'_, FormState>,
    profile: tauri::State<'_, ProfileState>,
) -> Result<String, String> {
    let form = state.lock();
    let invoice = build_invoice(form.customer_name(), form.items()).map_err(|e| e.to_string())?;
    Ok(html::render_html(&invoice, &profile.0))
}

#[tauri::command]
async fn generate_bill(
    app: AppHandle,
    state: tauri::State<'_, FormState>,
    profile: tauri::State<'_, ProfileState>,
) -> Result<String, String> {
    let surface = AppSurface { app: app.clone() };
    let invoice = {
        let mut form = state.lock();
        form.begin_submit(&surface).map_err(|e| e.to_string())?
    };

    let renderer = PrintPdfRenderer::new(profile.0.clone());
    let share = OpenerShare { app: app.clone() };
    let result = tauri::async_runtime::spawn_blocking(move || {
        let sink = DirectorySink::new(export_dir(&app)?);
        ExportPipeline::new(renderer, sink, share).export(&invoice)
    })
    .await
    .unwrap_or_else(|e| Err(ExportError::Render(e.to_string())));

    let mut form = state.lock();
    let file = form.finish_submit(result, &surface).map_err(|e| e.to_string())?;
    Ok(file.path.to_string_lossy().into_owned())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

    tauri::Builder::default()
        .setup(|app| {
            let profile = profile::resolve_profile();
            log::info!("[profile] issuing bills as {}", profile.business_name);
            app.manage(ProfileState(profile));
            Ok(())
        })
        .manage(FormState::default())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init())
        .invoke_handler(tauri::generate_handler![
            get_form,
            get_business_profile,
            set_customer_name,
            add_item,
            update_item,
            remove_item,
            preview_invoice_html,
            generate_bill
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

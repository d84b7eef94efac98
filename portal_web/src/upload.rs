use std::cell::RefCell;
use std::rc::Rc;

use gloo_net::http::Request;
use portal_core::upload::row_element_id;
use portal_core::{
    delete_request, finalize_target, parse_delete_response, parse_upload_response,
    DeleteControl, DeleteOutcome, FileList, FileRecord, FileRow, PortalConfig, PortalError,
    UploadPhase,
};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, FormData, HtmlFormElement, HtmlInputElement};

use crate::dom::{
    clear, create, js_err, listen, log_error, log_warn, page_url, report, set_disabled, window,
    Scope,
};

const PLACEHOLDER_ID: &str = "noFiles";
const DELETE_SELECTOR: &str = ".delete-btn";

/// Drives the upload page: selection preview, form upload, the rendered file
/// list with per-row deletion, and the finalize button.
pub struct UploadManager {
    config: Rc<PortalConfig>,
    scope: Scope,
    document: Document,
    form: HtmlFormElement,
    file_input: HtmlInputElement,
    selected: Element,
    file_list: Element,
    phase: RefCell<UploadPhase>,
    files: RefCell<FileList>,
}

impl UploadManager {
    pub fn attach(scope: &Scope, config: Rc<PortalConfig>) -> Result<Rc<Self>, PortalError> {
        let file_list: Element = scope.find("fileList")?;
        let files = FileList::from_rows(rows_from_dom(&file_list));
        let manager = Rc::new(Self {
            config,
            scope: scope.clone(),
            document: crate::dom::document()?,
            form: scope.find("uploadForm")?,
            file_input: scope.find("files")?,
            selected: scope.find("selectedFiles")?,
            file_list,
            phase: RefCell::new(UploadPhase::Idle),
            files: RefCell::new(files),
        });

        let m = Rc::clone(&manager);
        listen(&manager.file_input, "change", move |_| {
            if let Err(err) = m.on_select() {
                log_error("file selection", &err);
            }
        })?;

        let m = Rc::clone(&manager);
        listen(&manager.form, "submit", move |ev: Event| {
            ev.prevent_default();
            let m = Rc::clone(&m);
            spawn_local(async move { m.on_submit().await });
        })?;

        let m = Rc::clone(&manager);
        listen(&manager.file_list, "click", move |ev: Event| {
            let Some(button) = delete_button(&ev) else {
                return;
            };
            let m = Rc::clone(&m);
            spawn_local(async move { m.on_delete(button).await });
        })?;

        if let Some(finalize) = scope.find_opt::<Element>("finalizeBtn") {
            let m = Rc::clone(&manager);
            listen(&finalize, "click", move |_| m.on_finalize())?;
        }

        Ok(manager)
    }

    fn on_select(&self) -> Result<(), PortalError> {
        let mut names = Vec::new();
        if let Some(list) = self.file_input.files() {
            for i in 0..list.length() {
                if let Some(file) = list.item(i) {
                    names.push(file.name());
                }
            }
        }
        let next = self.phase.borrow().select(names)?;
        self.render_preview(&next)?;
        *self.phase.borrow_mut() = next;
        Ok(())
    }

    fn render_preview(&self, phase: &UploadPhase) -> Result<(), PortalError> {
        clear(&self.selected);
        for file in phase.preview() {
            let li = create(&self.document, "li", "selected-file")?;
            let icon = create(&self.document, "img", "file-icon")?;
            icon.set_attribute("src", file.icon.path(&self.config.icons))
                .map_err(js_err)?;
            icon.set_attribute("alt", "").map_err(js_err)?;
            let name = create(&self.document, "span", "")?;
            name.set_text_content(Some(&file.name));
            li.append_child(&icon).map_err(js_err)?;
            li.append_child(&name).map_err(js_err)?;
            self.selected.append_child(&li).map_err(js_err)?;
        }
        Ok(())
    }

    fn show_status(&self, class: &str, text: &str) -> Result<(), PortalError> {
        clear(&self.selected);
        let p = create(&self.document, "p", class)?;
        p.set_text_content(Some(text));
        self.selected.append_child(&p).map_err(js_err)?;
        Ok(())
    }

    async fn on_submit(self: Rc<Self>) {
        let uploading = match self.phase.borrow().submit() {
            Ok(next) => next,
            Err(err) => {
                log_warn("upload", &err);
                return;
            }
        };
        *self.phase.borrow_mut() = uploading;
        if let Err(err) = self.show_status("loading", &self.config.messages.uploading) {
            log_warn("upload", &err);
        }

        let result = self.send_upload().await;
        let rendered = match result {
            Ok(records) => self.finish_upload(&records),
            Err(err) => Err(err),
        };

        if let Err(err) = rendered {
            log_error("upload", &err);
            let message = format!(
                "{}{}",
                self.config.messages.error_prefix,
                err.user_message(&self.config.messages)
            );
            let failed = self.phase.borrow().fail(message.clone());
            match failed {
                Ok(next) => *self.phase.borrow_mut() = next,
                Err(e) => log_warn("upload", &e),
            }
            if let Err(e) = self.show_status("upload-error", &message) {
                log_warn("upload", &e);
            }
        }
    }

    async fn send_upload(&self) -> Result<Vec<FileRecord>, PortalError> {
        let action = self
            .form
            .get_attribute("action")
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| self.config.endpoints.upload.clone());
        let body = FormData::new_with_form(&self.form).map_err(js_err)?;
        let response = Request::post(&action)
            .body(body)
            .map_err(|e| PortalError::Transport(e.to_string()))?
            .send()
            .await
            .map_err(|e| PortalError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        parse_upload_response(status, &text)
    }

    /// Rows are built off-document first; the page is only touched once
    /// every row rendered.
    fn finish_upload(&self, records: &[FileRecord]) -> Result<(), PortalError> {
        let (files, added) = self.files.borrow().staged(records, &self.config.endpoints);
        let fragment = self.document.create_document_fragment();
        for row in &added {
            let li = self.render_row(row)?;
            fragment.append_child(&li).map_err(js_err)?;
        }
        let idle = self.phase.borrow().succeed()?;

        if let Some(placeholder) = self.scope.find_opt::<Element>(PLACEHOLDER_ID) {
            placeholder.remove();
        }
        self.file_list.append_child(&fragment).map_err(js_err)?;
        *self.files.borrow_mut() = files;
        *self.phase.borrow_mut() = idle;
        self.form.reset();
        clear(&self.selected);
        Ok(())
    }

    fn render_row(&self, row: &FileRow) -> Result<Element, PortalError> {
        let li = create(&self.document, "li", "")?;
        if let Some(id) = row.element_id() {
            li.set_id(&id);
        }
        let wrap = create(&self.document, "div", "flex flex-center flex-space-between")?;
        let link = create(&self.document, "a", "")?;
        if let Some(href) = &row.href {
            link.set_attribute("href", href).map_err(js_err)?;
        }
        link.set_attribute("target", "_blank").map_err(js_err)?;
        link.set_text_content(Some(&row.file_name));
        wrap.append_child(&link).map_err(js_err)?;

        if let Some(file_id) = row.file_id {
            let button = create(&self.document, "button", "delete-btn btn")?;
            button.set_attribute("type", "button").map_err(js_err)?;
            button
                .set_attribute("data-file-id", &file_id.to_string())
                .map_err(js_err)?;
            button.set_text_content(Some(&self.config.messages.delete_label));
            wrap.append_child(&button).map_err(js_err)?;
        }
        li.append_child(&wrap).map_err(js_err)?;
        Ok(li)
    }

    async fn on_delete(self: Rc<Self>, button: Element) {
        let Some(file_id) = button
            .get_attribute("data-file-id")
            .and_then(|v| v.trim().parse::<u64>().ok())
        else {
            log_warn("delete", &PortalError::Dom("delete button without a file id".into()));
            return;
        };
        if !self.files.borrow().contains(file_id) {
            log_warn("delete", &PortalError::MissingElement(row_element_id(file_id)));
        }
        let messages = &self.config.messages;
        let mut control = DeleteControl::new(file_id, button.text_content().unwrap_or_default());
        if let Err(err) = control.begin() {
            log_warn("delete", &err);
            return;
        }
        if let Err(err) = set_disabled(&button, true) {
            log_warn("delete", &err);
        }
        button.set_text_content(Some(control.label(messages)));

        let result = self.send_delete(control.file_id()).await;
        let outcome = control.finish(result, &mut self.files.borrow_mut());
        match outcome {
            DeleteOutcome::Removed { show_placeholder } => {
                if let Some(row) = self.scope.find_opt::<Element>(&row_element_id(file_id)) {
                    row.remove();
                }
                if show_placeholder {
                    if let Err(err) = self.show_placeholder() {
                        log_warn("delete", &err);
                    }
                }
            }
            DeleteOutcome::Restored { label, error } => {
                if let Err(err) = set_disabled(&button, false) {
                    log_warn("delete", &err);
                }
                button.set_text_content(Some(&label));
                report("delete", &error, messages);
            }
        }
    }

    async fn send_delete(&self, file_id: u64) -> Result<(), PortalError> {
        let request = delete_request(
            &self.config.endpoints,
            file_id,
            self.scope.person_identifier().as_deref(),
            self.config.delete_with_person_identifier,
        );
        let url = page_url(&request.path, &request.query())?;
        let response = Request::delete(&url)
            .send()
            .await
            .map_err(|e| PortalError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        parse_delete_response(status, &text)
    }

    fn show_placeholder(&self) -> Result<(), PortalError> {
        if self.scope.has(PLACEHOLDER_ID) {
            return Ok(());
        }
        let p = create(&self.document, "p", "")?;
        p.set_id(PLACEHOLDER_ID);
        p.set_text_content(Some(&self.config.messages.no_files));
        self.file_list.append_child(&p).map_err(js_err)?;
        Ok(())
    }

    fn on_finalize(&self) {
        let person = self.scope.person_identifier();
        let navigate = finalize_target(&self.config.endpoints, person.as_deref()).and_then(|target| {
            let url = page_url(&target.path, &target.query())?;
            window()?.location().set_href(&url).map_err(js_err)
        });
        if let Err(err) = navigate {
            report("finalize", &err, &self.config.messages);
        }
    }
}

fn delete_button(ev: &Event) -> Option<Element> {
    let target = ev.target()?.dyn_into::<Element>().ok()?;
    target.closest(DELETE_SELECTOR).ok().flatten()
}

/// Rebuild the list model from the rows the server rendered into the page.
fn rows_from_dom(file_list: &Element) -> Vec<FileRow> {
    let children = file_list.children();
    let mut rows = Vec::with_capacity(children.length() as usize);
    for i in 0..children.length() {
        let Some(child) = children.item(i) else {
            continue;
        };
        if child.id() == PLACEHOLDER_ID {
            continue;
        }
        let link = child.query_selector("a").ok().flatten();
        let file_name = link
            .as_ref()
            .and_then(|a| a.text_content())
            .or_else(|| child.text_content())
            .unwrap_or_default()
            .trim()
            .to_string();
        rows.push(FileRow {
            file_id: FileRow::parse_element_id(&child.id()),
            file_name,
            href: link.and_then(|a| a.get_attribute("href")),
        });
    }
    rows
}

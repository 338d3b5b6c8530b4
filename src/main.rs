use std::sync::{Arc, Mutex};

use hyper::Method;
use serde::Deserialize;

use restglue::handler::{HandlerResult, Request, ResourceHandler};
use restglue::http::{Element, JsonMessage, Response};
use restglue::paging::Browser;
use restglue::{config, logger, server, Application};

/// Largest factorial that fits in an `i64`
const MAX_FACTORIAL: i64 = 20;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    let app = Arc::new(build_app(&cfg)?);
    runtime.block_on(server::serve(app, &cfg))?;
    Ok(())
}

fn build_app(cfg: &config::Config) -> restglue::Result<Application> {
    let access_log = cfg
        .logging
        .access_log
        .then(|| cfg.logging.access_log_format.clone());
    let mut app = Application::new(&cfg.app).with_access_log(access_log);

    let notes = Notes::default();
    app.route("GET", "/factorial/<int:value>", factorial)?
        .route("GET", "/status", status)?
        .route("GET", "/greeting.xml", greeting)?
        .route("GET", "/notes", {
            let notes = notes.clone();
            move |req: &Request| notes.list(req)
        })?
        .route("POST", "/notes", {
            let notes = notes.clone();
            move |req: &Request| notes.create(req)
        })?
        .resource("/notes/<int:id>", notes)?;
    Ok(app)
}

fn factorial(req: &Request) -> HandlerResult {
    let value = req.var_int("value").unwrap_or_default();
    if !(0..=MAX_FACTORIAL).contains(&value) {
        return Err(Response::error(format!(
            "Value must be between 0 and {MAX_FACTORIAL}, got {value}."
        ))
        .into());
    }
    let result: i64 = (1..=value).product();
    Ok(Response::ok(format!("{value}! = {result}")))
}

fn status(_req: &Request) -> HandlerResult {
    Ok(JsonMessage::new("Service is running.", 200)
        .field("version", env!("CARGO_PKG_VERSION"))
        .to_response()?)
}

fn greeting(req: &Request) -> HandlerResult {
    let name = req.arg("name").unwrap_or("world");
    let document = Element::new("greeting")
        .attr("lang", "en")
        .child(Element::new("text").text(format!("Hello {name}.")));
    Ok(Response::xml(&document)?)
}

#[derive(Debug, Deserialize)]
struct NewNote {
    text: String,
}

/// In-memory note store shared by the note routes
#[derive(Debug, Clone, Default)]
struct Notes(Arc<Mutex<Vec<String>>>);

impl Notes {
    fn with_notes<T>(&self, f: impl FnOnce(&mut Vec<String>) -> T) -> Result<T, anyhow::Error> {
        let mut notes = self
            .0
            .lock()
            .map_err(|_| anyhow::anyhow!("note store lock poisoned"))?;
        Ok(f(&mut notes))
    }

    fn list(&self, req: &Request) -> HandlerResult {
        let notes = self.with_notes(|notes| notes.clone())?;
        Browser::default().respond(req, notes)
    }

    fn create(&self, req: &Request) -> HandlerResult {
        let note: NewNote = req.json()?;
        let id = self.with_notes(|notes| {
            notes.push(note.text);
            notes.len() - 1
        })?;
        Ok(JsonMessage::new("Note created.", 201)
            .field("id", id)
            .to_response()?)
    }

    fn lookup(&self, req: &Request) -> Result<usize, Response> {
        req.var_int("id")
            .and_then(|id| usize::try_from(id).ok())
            .ok_or_else(|| Response::not_found("No such note."))
    }
}

impl ResourceHandler for Notes {
    fn allowed_methods(&self) -> Vec<Method> {
        vec![Method::GET, Method::HEAD, Method::DELETE]
    }

    fn get(&self, req: &Request) -> HandlerResult {
        let id = self.lookup(req)?;
        match self.with_notes(|notes| notes.get(id).cloned())? {
            Some(text) => Ok(Response::ok(text)),
            None => Err(Response::not_found(format!("No note with id {id}.")).into()),
        }
    }

    fn delete(&self, req: &Request) -> HandlerResult {
        let id = self.lookup(req)?;
        let removed = self.with_notes(|notes| (id < notes.len()).then(|| notes.remove(id)))?;
        match removed {
            Some(_) => Ok(Response::no_content()),
            None => Err(Response::not_found(format!("No note with id {id}.")).into()),
        }
    }
}

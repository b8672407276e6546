use std::sync::Arc;

use actix_web::http::Method;
use fw_error::Result;
use fw_template::TemplateEngine;

use crate::{
    env::{Data, Env},
    request::Request,
    response::Response,
};

/// `Ok(None)` means the handler did not take the request.
pub type HandlerResult = Result<Option<Response>>;

/// A link of a handler chain. A handler either answers, or passes the
/// request on by calling `next`.
pub trait WebHandler: Send + Sync {
    fn handle(&self, env: &mut Env, data: &mut Data, next: Next<'_>) -> HandlerResult;
}

impl<H: WebHandler + ?Sized> WebHandler for Arc<H> {
    fn handle(&self, env: &mut Env, data: &mut Data, next: Next<'_>) -> HandlerResult {
        self.as_ref().handle(env, data, next)
    }
}

/// Rest of the current chain followed by the rest of every enclosing one.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rest: &'a [Arc<dyn WebHandler>],
    outer: Option<&'a Next<'a>>,
}

impl<'a> Next<'a> {
    pub fn end() -> Self {
        Self {
            rest: &[],
            outer: None,
        }
    }

    pub fn call(self, env: &mut Env, data: &mut Data) -> HandlerResult {
        match self.rest.split_first() {
            Some((first, rest)) => first.handle(
                env,
                data,
                Next {
                    rest,
                    outer: self.outer,
                },
            ),
            None => match self.outer {
                Some(outer) => outer.call(env, data),
                None => Ok(None),
            },
        }
    }
}

/// Handlers run in order, each one deciding whether to go on.
#[derive(Default, Clone)]
pub struct Chain {
    handlers: Vec<Arc<dyn WebHandler>>,
}

impl Chain {
    pub fn then<H: WebHandler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }
}

impl WebHandler for Chain {
    fn handle(&self, env: &mut Env, data: &mut Data, next: Next<'_>) -> HandlerResult {
        Next {
            rest: &self.handlers,
            outer: Some(&next),
        }
        .call(env, data)
    }
}

pub fn chain() -> Chain {
    Chain::default()
}

/// Alternatives tried in order; the first one to answer wins.
#[derive(Default, Clone)]
pub struct Cases {
    handlers: Vec<Arc<dyn WebHandler>>,
}

impl Cases {
    pub fn case<H: WebHandler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }
}

impl WebHandler for Cases {
    fn handle(&self, env: &mut Env, data: &mut Data, next: Next<'_>) -> HandlerResult {
        for handler in &self.handlers {
            if let Some(response) = handler.handle(env, data, next)? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}

pub fn cases() -> Cases {
    Cases::default()
}

struct MatchPath {
    path: String,
}

impl WebHandler for MatchPath {
    fn handle(&self, env: &mut Env, data: &mut Data, next: Next<'_>) -> HandlerResult {
        match env.request().path() == self.path {
            true => next.call(env, data),
            false => Ok(None),
        }
    }
}

/// Passes on only when the request path is exactly `path`.
pub fn match_path(path: &str) -> impl WebHandler {
    MatchPath {
        path: path.to_owned(),
    }
}

struct MatchMethod {
    method: Method,
}

impl WebHandler for MatchMethod {
    fn handle(&self, env: &mut Env, data: &mut Data, next: Next<'_>) -> HandlerResult {
        match *env.request().method() == self.method {
            true => next.call(env, data),
            false => Ok(None),
        }
    }
}

pub fn method(method: Method) -> impl WebHandler {
    MatchMethod { method }
}

struct FnHandler<F>(F);

impl<F> WebHandler for FnHandler<F>
where
    F: Fn(&mut Env, &mut Data, Next<'_>) -> HandlerResult + Send + Sync,
{
    fn handle(&self, env: &mut Env, data: &mut Data, next: Next<'_>) -> HandlerResult {
        (self.0)(env, data, next)
    }
}

pub fn handler<F>(f: F) -> impl WebHandler
where
    F: Fn(&mut Env, &mut Data, Next<'_>) -> HandlerResult + Send + Sync,
{
    FnHandler(f)
}

struct Endpoint<F>(F);

impl<F> WebHandler for Endpoint<F>
where
    F: Fn(&mut Env, &mut Data) -> Result<Response> + Send + Sync,
{
    fn handle(&self, env: &mut Env, data: &mut Data, _next: Next<'_>) -> HandlerResult {
        (self.0)(env, data).map(Some)
    }
}

/// Handler that always answers; ends the chain it is in.
pub fn endpoint<F>(f: F) -> impl WebHandler
where
    F: Fn(&mut Env, &mut Data) -> Result<Response> + Send + Sync,
{
    Endpoint(f)
}

/// Runs a whole application for one request with a fresh env and data.
pub fn run(
    app: &dyn WebHandler,
    request: Request,
    templates: Arc<dyn TemplateEngine>,
) -> HandlerResult {
    let mut env = Env::new(request, templates);
    let mut data = Data::new();
    app.handle(&mut env, &mut data, Next::end())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use fw_error::Error;
    use fw_template::LiquidTemplates;

    use super::*;
    use crate::testing::ask;

    fn text(body: &'static str) -> impl WebHandler {
        endpoint(move |_, _| Ok(Response::html(body.to_owned())))
    }

    fn run(app: &dyn WebHandler, request: Request) -> HandlerResult {
        ask(app, request, Arc::new(LiquidTemplates::new().unwrap()))
    }

    fn body(result: HandlerResult) -> Option<String> {
        result.unwrap().map(|response| response.body().to_owned())
    }

    #[test]
    fn cases_pick_first_answer() {
        let app = cases()
            .case(chain().then(match_path("/a")).then(text("a")))
            .case(chain().then(match_path("/b")).then(text("b")));

        assert_eq!(body(run(&app, Request::blank("/a"))), Some("a".to_owned()));
        assert_eq!(body(run(&app, Request::blank("/b"))), Some("b".to_owned()));
        assert_eq!(body(run(&app, Request::blank("/c"))), None);
    }

    #[test]
    fn chain_continues_with_outer_next() {
        let wrap = handler(|env, data, next| {
            data.insert("seen", &true)?;
            let response = next.call(env, data)?;
            Ok(response.map(|response| {
                let body = format!("[{}]", response.body());
                response.with_body(body)
            }))
        });
        let inner = chain().then(match_path("/x"));
        let app = chain()
            .then(wrap)
            .then(inner)
            .then(endpoint(|_, data| {
                Ok(Response::html(format!("seen={}", data.get("seen").is_some())))
            }));

        assert_eq!(
            body(run(&app, Request::blank("/x"))),
            Some("[seen=true]".to_owned())
        );
        assert_eq!(body(run(&app, Request::blank("/y"))), None);
    }

    #[test]
    fn method_filter() {
        let app = chain().then(method(Method::POST)).then(text("posted"));
        assert_eq!(body(run(&app, Request::blank("/"))), None);
        let request = Request::blank("/").with_post(Default::default());
        assert_eq!(body(run(&app, request)), Some("posted".to_owned()));
    }

    #[test]
    fn errors_stop_the_chain() {
        let app = chain()
            .then(handler(|_, _, _| Err(Error::redirect(303, "/login"))))
            .then(text("unreachable"));
        let err = run(&app, Request::blank("/")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SEE_OTHER.as_u16());
    }
}

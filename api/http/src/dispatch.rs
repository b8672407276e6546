use actix_multipart::Multipart;
use actix_web::{
    http::{header, StatusCode},
    web, HttpMessage, HttpRequest, HttpResponse,
};
use fw_error::Error;
use fw_forms::{MultiDict, RawValue, UploadedFile};
use fw_web::{HandlerResult, Request, Response};
use futures::StreamExt;

use crate::context::ApiHttpCtx;

const URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

pub async fn dispatch(
    ctx: web::Data<ApiHttpCtx>,
    req: HttpRequest,
    payload: web::Payload,
) -> HttpResponse {
    let request = match read_request(&req, payload).await {
        Ok(request) => request,
        Err(err) => return into_http_response(Err(err)),
    };

    let app = ctx.app().clone();
    let templates = ctx.templates().clone();
    match web::block(move || fw_web::run(app.as_ref(), request, templates)).await {
        Ok(result) => into_http_response(result),
        Err(err) => into_http_response(Err(Error::InternalServerError(err.to_string()))),
    }
}

async fn read_request(req: &HttpRequest, payload: web::Payload) -> Result<Request, Error> {
    let mut request = Request::new(
        req.method().clone(),
        req.path(),
        MultiDict::from_urlencoded(req.query_string()),
    )
    .with_headers(req.headers().clone());

    if let Ok(cookies) = req.cookies() {
        for cookie in cookies.iter() {
            request = request.with_cookie(cookie.name(), cookie.value());
        }
    }

    let post = match req.content_type() {
        URLENCODED => Some(read_urlencoded(payload).await?),
        MULTIPART => Some(read_multipart(req, payload).await?),
        _ => None,
    };
    if let Some(post) = post {
        request = request.with_post(post).with_method(req.method().clone());
    }

    Ok(request)
}

async fn read_urlencoded(mut payload: web::Payload) -> Result<MultiDict, Error> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|err| Error::BadRequest(err.to_string()))?;
        body.extend_from_slice(&chunk);
    }
    Ok(MultiDict::from_urlencoded(&String::from_utf8_lossy(&body)))
}

/// Text parts become text values; parts with a file name become uploaded
/// files, except the empty part browsers send for an untouched file input.
async fn read_multipart(req: &HttpRequest, payload: web::Payload) -> Result<MultiDict, Error> {
    let mut multipart = Multipart::new(req.headers(), payload);
    let mut post = MultiDict::new();

    while let Some(field) = multipart.next().await {
        let mut field = field.map_err(|err| Error::BadRequest(err.to_string()))?;
        let disposition = field.content_disposition();
        let Some(name) = disposition.get_name().map(str::to_owned) else {
            continue;
        };
        let filename = disposition.get_filename().map(str::to_owned);
        let content_type = field.content_type().map(|mime| mime.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|err| Error::BadRequest(err.to_string()))?;
            data.extend_from_slice(&chunk);
        }

        let value = match filename {
            Some(filename) if !filename.is_empty() || !data.is_empty() => RawValue::File(
                UploadedFile::new(&filename, content_type.as_deref(), data),
            ),
            Some(_) => RawValue::Text(String::new()),
            None => RawValue::Text(String::from_utf8_lossy(&data).into_owned()),
        };
        post.add(&name, value);
    }

    Ok(post)
}

fn into_http_response(result: HandlerResult) -> HttpResponse {
    match result {
        Ok(Some(response)) => to_http_response(response),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(Error::Http { status, location }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let mut builder = HttpResponse::build(status);
            if matches!(status, StatusCode::MOVED_PERMANENTLY | StatusCode::SEE_OTHER) {
                if let Some(location) = location {
                    builder.insert_header((header::LOCATION, fw_web::encode_location(&location)));
                }
            }
            builder.finish()
        }
        Err(err) => {
            let status =
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let body = match status.is_server_error() {
                true => {
                    fw_log::error(None, format!("[ApiHttpServer] {err}"));
                    status.canonical_reason().unwrap_or_default().to_owned()
                }
                false => err.to_string(),
            };
            HttpResponse::build(status)
                .content_type("text/plain; charset=utf-8")
                .body(body)
        }
    }
}

fn to_http_response(response: Response) -> HttpResponse {
    let mut builder = HttpResponse::build(response.status());
    for (name, value) in response.headers() {
        builder.append_header((name.clone(), value.clone()));
    }
    for cookie in response.cookies() {
        builder.cookie(cookie.clone());
    }
    builder.body(response.body().to_owned())
}

//! Request — parsed routable view of one inbound call
//!
//! A [`Request`] is built once per inbound call by [`Request::parse`] (or
//! [`Request::parse_from_transport`]) and is immutable afterwards, except
//! that already-populated parameters may be overridden via
//! [`Request::set_param`].
//!
//! Parsing is decomposed into pure helper functions; each consumes its
//! inputs and returns a value, and the top-level parse composes the results.

use crate::{DispatchError, ActionError, DEFAULT_ACTION, DEFAULT_CONTROLLER};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Server/environment variables supplied by the transport boundary, keyed
/// the way a CGI-like gateway names them (`REQUEST_URI`, `REMOTE_ADDR`,
/// `HTTP_ACCEPT_LANGUAGE`, ...).
pub type ServerVars = HashMap<String, String>;

/// Transport-supplied parameter sources merged into the request parameters
/// before path and query parsing.
///
/// Later sources overwrite earlier same-named entries: `get` < `post` <
/// `cookie` < `files` < `session`. Path-pair and query-string parameters are
/// merged afterwards and take precedence over all of these.
#[derive(Debug, Clone, Default)]
pub struct ParamSources {
    /// Query-like parameters decoded by the gateway.
    pub get: HashMap<String, String>,
    /// Form body parameters.
    pub post: HashMap<String, String>,
    /// Cookie values.
    pub cookie: HashMap<String, String>,
    /// Uploaded file descriptors (name → temporary location or token).
    pub files: HashMap<String, String>,
    /// Session values, when the boundary maintains a session store.
    pub session: HashMap<String, String>,
}

/// Header-like metadata variables mapped into the parameter set under their
/// wire names. These are applied last and therefore shadow same-named
/// path-pair and query-string parameters — a long-standing precedence quirk
/// that is preserved, not fixed (see [`Request::parse`]).
const METADATA_VARS: [(&str, &str); 9] = [
    ("HTTP_ACCEPT", "Accept"),
    ("HTTP_ACCEPT_LANGUAGE", "Accept-Language"),
    ("HTTP_ACCEPT_ENCODING", "Accept-Encoding"),
    ("HTTP_UA_CPU", "User-Agent-CPU"),
    ("HTTP_USER_AGENT", "User-Agent"),
    ("HTTP_HOST", "Host"),
    ("HTTP_CACHE_CONTROL", "Cache-Control"),
    ("HTTP_CONNECTION", "Connection"),
    ("HTTP_X_FORWARDED_FOR", "X-Forwarded-For"),
];

/// One inbound call, parsed into routable components.
#[derive(Debug, Clone)]
pub struct Request {
    /// The raw request string as received.
    origin: String,
    /// Requested controller simple name; never empty (defaults apply).
    controller: String,
    /// Requested action name; never empty (defaults apply).
    action: String,
    /// Parameters from all sources, by name.
    params: HashMap<String, String>,
    /// Path prefix under which the application is mounted.
    context_prefix: Option<String>,
    /// Client address, as far as the transport reports it.
    remote_host: Option<String>,
    /// Failure carried into the error-fallback path, if any.
    failure: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Request {
    /// Parse a URI and server variables with the built-in defaults
    /// (`Index` / `index`) and no extra parameter sources.
    pub fn parse(uri: &str, server_vars: &ServerVars) -> Self {
        Self::parse_with(
            uri,
            server_vars,
            &ParamSources::default(),
            DEFAULT_CONTROLLER,
            DEFAULT_ACTION,
        )
    }

    /// Parse a URI and server variables into a request.
    ///
    /// Steps, in order:
    ///
    /// 1. `remote_host` from `REMOTE_ADDR`, overridden by
    ///    `HTTP_X_FORWARDED_FOR` when present. The forwarded value winning
    ///    models trusting a proxy; with an untrusted peer the reported
    ///    client address is attacker-controlled. Security caveat, by
    ///    contract of the transport boundary.
    /// 2. [`ParamSources`] merged into the parameters, later sources
    ///    overwriting earlier same-named entries.
    /// 3. A query component is split off the URI and parsed separately.
    /// 4. The context prefix is resolved (`CONTEXT_PREFIX` →
    ///    `REDIRECT_BASE` → derived from `SCRIPT_FILENAME`/`SCRIPT_NAME`
    ///    when `HTTP_HOST` is present).
    /// 5. The prefix is stripped from the path and the remainder split on
    ///    `/`: first segment → controller (first letter upper-cased),
    ///    second → action, remaining segments consumed as `name/value`
    ///    pairs. Query parameters are merged afterwards and win over
    ///    same-named path pairs.
    /// 6. Metadata variables (`Accept`, `Accept-Language`, `User-Agent`,
    ///    `Host`, ...) mapped in under their wire names. They are applied
    ///    after step 5 and shadow same-named path/query parameters —
    ///    preserved quirk.
    /// 7. `Accept-Language-Best` derived from `Accept-Language`: the first
    ///    candidate wins unless a later candidate is the first to look like
    ///    a `language[-_]region` tag. Quality weights are not honored
    ///    (known simplification).
    pub fn parse_with(
        uri: &str,
        server_vars: &ServerVars,
        sources: &ParamSources,
        default_controller: &str,
        default_action: &str,
    ) -> Self {
        let remote_host = parse_remote_host(server_vars);

        let mut params = HashMap::new();
        merge_sources(&mut params, sources);

        let (path, query) = split_query(uri);
        let query_params = query.map(parse_query).unwrap_or_default();

        let context_prefix = parse_context_prefix(server_vars);

        let (controller, action, pairs) = split_route(
            path,
            context_prefix.as_deref(),
            default_controller,
            default_action,
        );
        params.extend(pairs);
        params.extend(query_params);

        for (var, name) in METADATA_VARS {
            if let Some(value) = server_vars.get(var) {
                params.insert(name.to_string(), value.clone());
            }
        }
        if let Some(best) = params.get("Accept-Language").map(|v| best_language(v)) {
            params.insert("Accept-Language-Best".to_string(), best);
        }

        Self {
            origin: uri.to_string(),
            controller,
            action,
            params,
            context_prefix,
            remote_host,
            failure: None,
        }
    }

    /// Derive a request directly from the transport variables, with the
    /// built-in defaults.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidRequest`] when `REQUEST_URI` is absent.
    pub fn parse_from_transport(server_vars: &ServerVars) -> Result<Self, DispatchError> {
        Self::parse_from_transport_with(
            server_vars,
            &ParamSources::default(),
            DEFAULT_CONTROLLER,
            DEFAULT_ACTION,
        )
    }

    /// Derive a request directly from the transport variables.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidRequest`] when `REQUEST_URI` is absent
    /// (e.g. a non-HTTP invocation context).
    pub fn parse_from_transport_with(
        server_vars: &ServerVars,
        sources: &ParamSources,
        default_controller: &str,
        default_action: &str,
    ) -> Result<Self, DispatchError> {
        let uri = server_vars
            .get("REQUEST_URI")
            .ok_or(DispatchError::InvalidRequest)?;
        Ok(Self::parse_with(
            uri,
            server_vars,
            sources,
            default_controller,
            default_action,
        ))
    }

    /// The raw request string as received.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The requested controller simple name. Never empty.
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// The requested action name. Never empty.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// All parameters, by name.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// The path prefix under which the application is mounted, if any.
    pub fn context_prefix(&self) -> Option<&str> {
        self.context_prefix.as_deref()
    }

    /// The client address, as far as the transport reports it.
    pub fn remote_host(&self) -> Option<&str> {
        self.remote_host.as_deref()
    }

    /// A parameter as text, HTML-entity escaped (`&`, `<`, `>`, `"`, `'`).
    ///
    /// The escape guards against reflected injection when values are echoed
    /// into markup; use [`Request::param_raw`] when the raw value is needed.
    pub fn param(&self, name: &str) -> Option<String> {
        self.params.get(name).map(|v| escape_html(v))
    }

    /// A parameter as received, unescaped.
    pub fn param_raw(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// A parameter coerced to a boolean: any non-empty value other than
    /// `"0"` is `true`.
    pub fn param_bool(&self, name: &str) -> Option<bool> {
        self.params
            .get(name)
            .map(|v| !v.is_empty() && v != "0")
    }

    /// A parameter coerced to an integer; `None` when missing or not
    /// numeric.
    pub fn param_int(&self, name: &str) -> Option<i64> {
        self.params.get(name).and_then(|v| v.trim().parse().ok())
    }

    /// A parameter coerced to a float; `None` when missing or not numeric.
    pub fn param_float(&self, name: &str) -> Option<f64> {
        self.params.get(name).and_then(|v| v.trim().parse().ok())
    }

    /// Override a parameter that parsing populated.
    ///
    /// Parameters are not freely extensible after parsing, only
    /// overridable.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownParameter`] when `name` was never populated.
    pub fn set_param(
        &mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DispatchError> {
        match self.params.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(DispatchError::UnknownParameter {
                name: name.to_string(),
            }),
        }
    }

    /// The failure carried into the error-fallback path, if any.
    pub fn failure(&self) -> Option<&(dyn std::error::Error + Send + Sync)> {
        self.failure.as_deref()
    }

    /// Attach a recovered failure before rerouting to the exception action.
    pub(crate) fn attach_failure(&mut self, failure: ActionError) {
        self.failure = Some(Arc::from(failure));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Parsing helpers (pure)
// ═══════════════════════════════════════════════════════════════════════════════

/// Client address: `REMOTE_ADDR`, overridden by `HTTP_X_FORWARDED_FOR`.
fn parse_remote_host(server_vars: &ServerVars) -> Option<String> {
    let mut remote = server_vars.get("REMOTE_ADDR").cloned();
    if let Some(forwarded) = server_vars.get("HTTP_X_FORWARDED_FOR") {
        remote = Some(forwarded.clone());
    }
    remote
}

/// Merge transport parameter sources; later sources win.
fn merge_sources(params: &mut HashMap<String, String>, sources: &ParamSources) {
    for source in [
        &sources.get,
        &sources.post,
        &sources.cookie,
        &sources.files,
        &sources.session,
    ] {
        for (name, value) in source {
            params.insert(name.clone(), value.clone());
        }
    }
}

/// Split a query component off the URI. The query must follow at least one
/// path character; a URI that *starts* with `?` is left alone.
fn split_query(uri: &str) -> (&str, Option<&str>) {
    match uri.find('?') {
        Some(pos) if pos > 0 => (&uri[..pos], Some(&uri[pos + 1..])),
        _ => (uri, None),
    }
}

/// Parse a query string into a parameter map, percent-decoding keys and
/// values. A bare key without `=` maps to the empty string.
fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(url_decode(key), url_decode(value));
    }
    params
}

/// Percent-decode a URL component; `+` decodes to space. Malformed escapes
/// are passed through verbatim.
fn url_decode(component: &str) -> String {
    fn hex(byte: u8) -> Option<u8> {
        (byte as char).to_digit(16).map(|d| d as u8)
    }

    let bytes = component.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => match (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                (Some(high), Some(low)) => {
                    out.push(high << 4 | low);
                    i += 3;
                }
                _ => {
                    out.push(b'%');
                    i += 1;
                }
            },
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Resolve the context prefix: `CONTEXT_PREFIX` (with a trailing slash
/// appended) → `REDIRECT_BASE` → derived from the script path when a host
/// variable is present. First matching source wins.
fn parse_context_prefix(server_vars: &ServerVars) -> Option<String> {
    if let Some(prefix) = server_vars.get("CONTEXT_PREFIX") {
        if !prefix.is_empty() {
            return Some(format!("{prefix}/"));
        }
    }
    if let Some(base) = server_vars.get("REDIRECT_BASE") {
        return Some(base.clone());
    }
    if let (Some(filename), Some(script_name), Some(_host)) = (
        server_vars.get("SCRIPT_FILENAME"),
        server_vars.get("SCRIPT_NAME"),
        server_vars.get("HTTP_HOST"),
    ) {
        // Script basename removed from the script name leaves the mount
        // path, e.g. "/app/tests/index.php" -> "/app/tests/".
        let basename = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(filename.as_str());
        if !basename.is_empty() {
            return Some(script_name.replace(basename, ""));
        }
        return Some(script_name.clone());
    }
    None
}

/// Split the path into controller, action and trailing `name/value`
/// parameter pairs, applying defaults for missing or empty segments.
///
/// A pair with an empty name or value is dropped, as is a trailing segment
/// with no value following it.
fn split_route(
    path: &str,
    context_prefix: Option<&str>,
    default_controller: &str,
    default_action: &str,
) -> (String, String, Vec<(String, String)>) {
    let mut context_uri = path.to_string();
    if let Some(prefix) = context_prefix {
        if !prefix.is_empty() && prefix != "/" {
            context_uri = context_uri.replace(prefix, "");
        }
    }

    let trimmed = context_uri.trim_start_matches('/');
    let segments: Vec<&str> = if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    };
    let mut segments = segments.into_iter();

    let controller = match segments.next().map(|s| ucfirst(s.trim())) {
        Some(name) if !name.is_empty() => name,
        _ => default_controller.to_string(),
    };
    let action = match segments.next().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => default_action.to_string(),
    };

    let rest: Vec<&str> = segments.collect();
    let mut pairs = Vec::new();
    let mut i = 0;
    while i < rest.len() {
        let name = rest[i].trim();
        let value = rest.get(i + 1).map_or("", |v| v.trim());
        if !name.is_empty() && !value.is_empty() {
            pairs.push((name.to_string(), value.to_string()));
        }
        i += 2;
    }

    (controller, action, pairs)
}

/// Upper-case the first character, ASCII-style.
pub(crate) fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Pick the best language from an `Accept-Language` value: default to the
/// first candidate, then prefer the first candidate matching a
/// `language[-_]region` tag. Quality weights are intentionally ignored.
fn best_language(accept: &str) -> String {
    static LANGUAGE_TAG: OnceLock<Regex> = OnceLock::new();
    let pattern = LANGUAGE_TAG.get_or_init(|| {
        Regex::new(r"^(?i)([a-z]{2}[-_](?:[a-z]{2}){1,2}(?:_[a-z]{2})?)")
            .expect("language tag pattern is valid")
    });

    let mut best = accept.split(',').next().unwrap_or("").to_string();
    for candidate in accept.split(',') {
        if let Some(tag) = pattern.captures(candidate).and_then(|caps| caps.get(1)) {
            best = tag.as_str().to_string();
            break;
        }
    }
    best
}

/// Escape the five HTML-sensitive characters.
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

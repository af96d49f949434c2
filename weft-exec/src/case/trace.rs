use std::collections::BTreeMap;

/// Which side of a trace entry a reference resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceSide {
    Request,
    Response,
}

/// The recorded request half of a trace entry. Non-HTTP activities synthesize
/// a pseudo-URL so the trace stays uniform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRequest {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub mime: String,
}

impl TraceRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            query: BTreeMap::new(),
            body: Vec::new(),
            mime: String::new(),
        }
    }

    /// Pseudo-request for activities with no wire interaction of their own.
    pub fn synthetic(kind: &str, name: &str) -> Self {
        Self::new("GET", format!("activity://localhost/{kind}/{name}"))
    }

    pub fn with_body(mut self, body: Vec<u8>, mime: impl Into<String>) -> Self {
        self.body = body;
        self.mime = mime.into();
        self
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_query(mut self, query: BTreeMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub mime: String,
}

impl TraceResponse {
    pub fn new(status: u16, body: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
            mime: mime.into(),
        }
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// What one activity saw and returned, keyed by the activity's name in the
/// case. The inbound call is recorded under the reserved `request` name with
/// no response half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub request: TraceRequest,
    pub response: Option<TraceResponse>,
}

impl TraceEntry {
    pub fn inbound(request: TraceRequest) -> Self {
        Self {
            request,
            response: None,
        }
    }

    pub fn exchange(request: TraceRequest, response: TraceResponse) -> Self {
        Self {
            request,
            response: Some(response),
        }
    }

    pub fn body(&self, side: TraceSide) -> Option<&[u8]> {
        match side {
            TraceSide::Request => Some(&self.request.body),
            TraceSide::Response => self.response.as_ref().map(|r| r.body.as_slice()),
        }
    }

    pub fn headers(&self, side: TraceSide) -> Option<&BTreeMap<String, String>> {
        match side {
            TraceSide::Request => Some(&self.request.headers),
            TraceSide::Response => self.response.as_ref().map(|r| &r.headers),
        }
    }
}

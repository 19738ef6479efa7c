use std::{
    collections::VecDeque,
    future::Future,
    sync::Mutex,
};

use crate::domain::{
    classification::{ports::ChatTransport, value_objects::TransportRequest},
    common::entities::app_errors::CoreError,
};

/// Transport that replays a fixed script of outcomes and records requests.
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<String, CoreError>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Result<String, CoreError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ChatTransport for ScriptedTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<String, CoreError>> + Send {
        self.requests.lock().unwrap().push(request);
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CoreError::Network("script exhausted".to_string())));
        async move { outcome }
    }
}

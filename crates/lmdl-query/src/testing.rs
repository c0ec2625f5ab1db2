//! In-memory engine and label lookup shared by the unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lmdl_client::{LabelLookup, LabelResolver, SearchEngine, SelectParams, SelectResponse};
use lmdl_core::{EntityLabels, LabelMap, Result};
use serde_json::Value;

type Matcher = Box<dyn Fn(&SelectParams) -> bool + Send + Sync>;

#[derive(Default)]
struct EngineState {
    rules: Vec<(Matcher, SelectResponse)>,
    requests: Vec<SelectParams>,
    field_names: Vec<String>,
}

/// Engine answering selects from scripted rules; first matching rule wins,
/// no match gives an empty response.
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    state: Arc<Mutex<EngineState>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: SelectResponse) -> Self {
        self.respond_when(|_| true, response)
    }

    pub fn respond_when(
        self,
        matcher: impl Fn(&SelectParams) -> bool + Send + Sync + 'static,
        response: SelectResponse,
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .rules
            .push((Box::new(matcher), response));
        self
    }

    pub fn with_field_names(self, names: &[&str]) -> Self {
        self.state.lock().unwrap().field_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn requests(&self) -> Vec<SelectParams> {
        self.state.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl SearchEngine for ScriptedEngine {
    async fn add(&self, _docs: &[Value]) -> Result<u16> {
        Ok(200)
    }

    async fn delete_all(&self) -> Result<u16> {
        Ok(200)
    }

    async fn select(&self, params: &SelectParams) -> Result<SelectResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(params.clone());
        Ok(state
            .rules
            .iter()
            .find(|(matcher, _)| matcher(params))
            .map(|(_, response)| response.clone())
            .unwrap_or_default())
    }

    async fn field_names(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().field_names.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct LookupState {
    labels: LabelMap,
    requested: Vec<Vec<String>>,
}

/// Label lookup backed by a fixed map, recording each request.
#[derive(Clone, Default)]
pub struct StaticLookup {
    state: Arc<Mutex<LookupState>>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, id: &str, label: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .labels
            .insert(id.to_string(), EntityLabels::labelled(label));
        self
    }

    pub fn into_resolver(self) -> LabelResolver {
        LabelResolver::new(Arc::new(self))
    }

    pub fn requests(&self) -> usize {
        self.state.lock().unwrap().requested.len()
    }

    pub fn requested_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().requested.concat()
    }
}

#[async_trait]
impl LabelLookup for StaticLookup {
    async fn fetch(&self, ids: &[String]) -> Result<LabelMap> {
        let mut state = self.state.lock().unwrap();
        state.requested.push(ids.to_vec());
        Ok(ids
            .iter()
            .filter_map(|id| state.labels.get(id).map(|l| (id.clone(), l.clone())))
            .collect())
    }
}

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use medusa::{
    application::{
        jobs::{QueueError, RenderQueue},
        renderable::Renderable,
        renderer::{RenderError, RendererInstance, StaticSiteRenderer},
    },
    domain::{
        error::DomainError,
        paths::{StaticPath, static_paths},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    InitializeOutput,
    AssignPaths(Vec<StaticPath>),
    Generate(Vec<StaticPath>),
    FinalizeOutput,
}

/// Renderer that records every protocol step it is driven through.
#[derive(Default)]
pub struct RecordingRenderer {
    steps: Arc<Mutex<Vec<Step>>>,
}

impl RecordingRenderer {
    pub fn steps(&self) -> Vec<Step> {
        self.steps.lock().expect("steps lock").clone()
    }
}

struct RecordingInstance {
    steps: Arc<Mutex<Vec<Step>>>,
    paths: Vec<StaticPath>,
}

#[async_trait]
impl StaticSiteRenderer for RecordingRenderer {
    async fn initialize_output(&self) -> Result<(), RenderError> {
        self.steps
            .lock()
            .expect("steps lock")
            .push(Step::InitializeOutput);
        Ok(())
    }

    fn instance(&self) -> Box<dyn RendererInstance> {
        Box::new(RecordingInstance {
            steps: Arc::clone(&self.steps),
            paths: Vec::new(),
        })
    }

    async fn finalize_output(&self) -> Result<(), RenderError> {
        self.steps
            .lock()
            .expect("steps lock")
            .push(Step::FinalizeOutput);
        Ok(())
    }
}

#[async_trait]
impl RendererInstance for RecordingInstance {
    fn assign_paths(&mut self, paths: Vec<StaticPath>) {
        self.steps
            .lock()
            .expect("steps lock")
            .push(Step::AssignPaths(paths.clone()));
        self.paths = paths;
    }

    async fn generate(&mut self) -> Result<(), RenderError> {
        self.steps
            .lock()
            .expect("steps lock")
            .push(Step::Generate(self.paths.clone()));
        Ok(())
    }
}

/// Queue that keeps every enqueued batch in memory.
#[derive(Default)]
pub struct RecordingQueue {
    batches: Mutex<Vec<Vec<StaticPath>>>,
}

impl RecordingQueue {
    pub fn batches(&self) -> Vec<Vec<StaticPath>> {
        self.batches.lock().expect("batches lock").clone()
    }
}

#[async_trait]
impl RenderQueue for RecordingQueue {
    async fn enqueue(&self, paths: Vec<StaticPath>) -> Result<String, QueueError> {
        let mut batches = self.batches.lock().expect("batches lock");
        batches.push(paths);
        Ok(format!("job-{}", batches.len()))
    }
}

/// Queue whose storage is always down.
pub struct FailingQueue;

#[async_trait]
impl RenderQueue for FailingQueue {
    async fn enqueue(&self, _paths: Vec<StaticPath>) -> Result<String, QueueError> {
        Err(QueueError::storage("connection refused"))
    }
}

pub struct Article {
    pub id: u32,
}

impl Renderable for Article {
    fn render_static(&self) -> Result<Vec<StaticPath>, DomainError> {
        Ok(static_paths([
            format!("/a/{}", self.id),
            format!("/a/{}", self.id + 1),
        ]))
    }

    fn model_name(&self) -> &'static str {
        "article"
    }
}

/// A model that never affects static output.
pub struct Comment;

/// A renderable model with nothing to regenerate.
pub struct Draft;

impl Renderable for Draft {
    fn render_static(&self) -> Result<Vec<StaticPath>, DomainError> {
        Ok(Vec::new())
    }
}

/// A renderable model whose path lookup fails.
pub struct Orphan;

impl Renderable for Orphan {
    fn render_static(&self) -> Result<Vec<StaticPath>, DomainError> {
        Err(DomainError::not_found("parent category"))
    }
}

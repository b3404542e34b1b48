#![allow(dead_code)] // not every test binary uses every helper

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use buildwatch::errors::{BuildwatchError, Result};
use buildwatch::pipeline::{ToolInvoker, ToolOutput};

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokedCall {
    pub tool: String,
    pub args: Vec<String>,
}

#[derive(Clone)]
enum FakeResponse {
    Output(ToolOutput),
    LaunchFailure(String),
}

/// A fake invoker that records calls and fabricates tool results.
///
/// An optional hook runs at invocation time, which lets tests assert on
/// filesystem state *between* the clean/ensure steps and the invoke step.
pub struct FakeInvoker {
    calls: Arc<Mutex<Vec<InvokedCall>>>,
    response: FakeResponse,
    hook: Option<Arc<dyn Fn(&InvokedCall) + Send + Sync>>,
}

impl FakeInvoker {
    /// Exit 0, empty stdout/stderr.
    pub fn succeeding() -> Self {
        Self::with_output(ToolOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    pub fn with_output(output: ToolOutput) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            response: FakeResponse::Output(output),
            hook: None,
        }
    }

    pub fn failing_launch(msg: &str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            response: FakeResponse::LaunchFailure(msg.to_string()),
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: impl Fn(&InvokedCall) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<InvokedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Shared handle on the recorded calls, for tests that move the invoker
    /// into a pipeline loop.
    pub fn calls_handle(&self) -> Arc<Mutex<Vec<InvokedCall>>> {
        Arc::clone(&self.calls)
    }
}

impl ToolInvoker for FakeInvoker {
    fn invoke(
        &self,
        tool: &str,
        args: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput>> + Send + '_>> {
        let call = InvokedCall {
            tool: tool.to_string(),
            args,
        };

        if let Some(hook) = &self.hook {
            hook(&call);
        }

        self.calls.lock().unwrap().push(call);

        let response = self.response.clone();
        Box::pin(async move {
            match response {
                FakeResponse::Output(output) => Ok(output),
                FakeResponse::LaunchFailure(msg) => Err(BuildwatchError::ToolLaunch(msg)),
            }
        })
    }
}

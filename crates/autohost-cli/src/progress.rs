use cliclack::{ProgressBar, spinner};

/// Progress of one provisioning step, as reported by the step runner.
#[derive(Debug)]
pub enum StepEvent<'a> {
    Started { id: &'a str, description: &'a str },
    Finished { id: &'a str, result: StepResult },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    Pass(String),
    Skip(String),
    Fail(String),
}

/// Renders step events as cliclack spinners on a terminal, or as plain lines otherwise.
pub struct ProgressRenderer {
    interactive: bool,
    active_spinner: Option<(String, ProgressBar)>,
}

impl ProgressRenderer {
    pub fn new(interactive: bool) -> Self {
        Self {
            interactive,
            active_spinner: None,
        }
    }

    pub fn handle_event(&mut self, event: StepEvent<'_>) {
        match event {
            StepEvent::Started { id, description } => {
                // Steps run one at a time, so a new start means the previous one was abandoned.
                if let Some((old_id, s)) = self.active_spinner.take() {
                    s.stop(format!("{old_id} (interrupted)"));
                }

                if self.interactive {
                    let s = spinner();
                    s.start(description);
                    self.active_spinner = Some((id.to_string(), s));
                } else {
                    println!("[{id}] {description}");
                }
            }
            StepEvent::Finished { id, result } => {
                let active = self.active_spinner.take();
                match active {
                    Some((current_id, s)) if current_id == id => match result {
                        StepResult::Pass(msg) => s.stop(format!("{id}: {msg}")),
                        StepResult::Skip(msg) => s.stop(format!("{id} skipped: {msg}")),
                        StepResult::Fail(msg) => s.error(format!("{id} failed: {msg}")),
                    },
                    other => {
                        self.active_spinner = other;
                        self.log(id, &result);
                    }
                }
            }
        }
    }

    fn log(&self, id: &str, result: &StepResult) {
        if self.interactive {
            match result {
                StepResult::Pass(msg) => cliclack::log::success(format!("{id}: {msg}")).ok(),
                StepResult::Skip(msg) => cliclack::log::remark(format!("{id} skipped: {msg}")).ok(),
                StepResult::Fail(msg) => cliclack::log::error(format!("{id} failed: {msg}")).ok(),
            };
            return;
        }
        match result {
            StepResult::Pass(msg) => println!("[{id}] pass: {msg}"),
            StepResult::Skip(msg) => println!("[{id}] skip: {msg}"),
            StepResult::Fail(msg) => println!("[{id}] fail: {msg}"),
        }
    }
}

#![allow(dead_code)]

use jobrunner::config::{Destination, Environment, Execution, Job, Script, Shell, Task};

/// Builder for `Job` to simplify test setup.
pub struct JobBuilder {
    name: String,
    tasks: Vec<Task>,
}

impl JobBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tasks: Vec::new(),
        }
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.tasks.push(Task::Script(script));
        self
    }

    pub fn with_serial(mut self, steps: Vec<Script>) -> Self {
        self.tasks.push(Task::Serial(steps));
        self
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn build(self) -> Job {
        Job::new_unchecked(self.name, self.tasks)
    }
}

/// Builder for `Script`.
///
/// Starts as a local, blocking bash script with an empty environment.
pub struct ScriptBuilder {
    script: Script,
}

impl ScriptBuilder {
    pub fn new(name: &str, body: &str) -> Self {
        Self {
            script: Script {
                name: name.to_string(),
                script: body.to_string(),
                shell: Shell::Bash,
                destination: Destination::Local,
                environment: Environment::None,
                execution: Execution::Blocking,
            },
        }
    }

    pub fn custom_shell(mut self, cmd: &str) -> Self {
        self.script.shell = Shell::Custom(cmd.to_string());
        self
    }

    pub fn remote(mut self, host: &str) -> Self {
        self.script.destination = Destination::Remote(host.to_string());
        self
    }

    pub fn inherit_env(mut self) -> Self {
        self.script.environment = Environment::Current;
        self
    }

    pub fn background(mut self) -> Self {
        self.script.execution = Execution::Background;
        self
    }

    pub fn build(self) -> Script {
        self.script
    }
}

/// Shorthand for a local blocking bash script.
pub fn script(name: &str, body: &str) -> Script {
    ScriptBuilder::new(name, body).build()
}

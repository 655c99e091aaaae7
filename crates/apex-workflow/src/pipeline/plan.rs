use super::steps::{install_steps, Step};
use super::template::render_args;
use std::fmt;
use std::time::Duration;

/// A step with its placeholders resolved, ready to be shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub name: &'static str,
    pub program: &'static str,
    pub args: Vec<String>,
    pub milestone: Option<u8>,
    pub timeout: Duration,
}

impl PlannedStep {
    pub fn command_line(&self) -> String {
        let mut line = self.program.to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(' ') {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

#[derive(Debug, Clone)]
pub struct InstallPlan {
    pub drive: String,
    pub image_path: String,
    pub steps: Vec<PlannedStep>,
}

impl InstallPlan {
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push("Execution plan:".to_string());
        for (idx, step) in self.steps.iter().enumerate() {
            let milestone = step
                .milestone
                .map(|pct| format!(" [{}%]", pct))
                .unwrap_or_default();
            lines.push(format!(
                "{:02}. {} — {}{}",
                idx,
                step.name,
                step.command_line(),
                milestone
            ));
        }
        lines.push(format!("Target: {} (all data will be erased)", self.drive));
        lines.push(format!("Image: {}", self.image_path));
        lines
    }
}

impl fmt::Display for InstallPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.summary_lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Resolve the canonical steps for `drive` and `image_path` without running
/// anything.
pub fn build_plan(drive: &str, image_path: &str) -> InstallPlan {
    plan_steps(install_steps(), drive, image_path)
}

fn plan_steps(steps: &[Step], drive: &str, image_path: &str) -> InstallPlan {
    InstallPlan {
        drive: drive.to_string(),
        image_path: image_path.to_string(),
        steps: steps
            .iter()
            .map(|step| PlannedStep {
                name: step.name,
                program: step.program,
                args: render_args(step.args, drive, image_path),
                milestone: step.milestone,
                timeout: step.timeout,
            })
            .collect(),
    }
}

use super::{process, redirect, EvalContext, ExitStatus, Executor};
use crate::ast::SimpleCommand;
use crate::error::{ErrorReport, ExecError, FAILURE_CODE};
use log::{debug, warn};
use nix::unistd::execvp;

impl Executor {
    /// Run one leaf: a builtin in this process, or an external program in a
    /// forked child that this process waits for.
    pub(super) fn execute_leaf(
        &self,
        cmd: &SimpleCommand,
        ctx: EvalContext,
    ) -> Result<ExitStatus, ExecError> {
        let Some(verb) = cmd.verb.resolve() else {
            warn!("{}", ExecError::Construction("command has no verb"));
            return Ok(ExitStatus::Terminate);
        };

        debug!("[{}] {}", ctx.depth, cmd);

        if let Some(result) = self.builtins.execute(&verb, cmd) {
            return result;
        }

        let child = process::fork_branch(|| self.exec_child(&verb, cmd))?;
        let code = process::wait_for(child, self.config.signal_status)?;
        Ok(ExitStatus::Code(code))
    }

    /// Child side of an external command: redirect, then replace the process
    /// image. Returns only when something failed, with the status to exit with.
    fn exec_child(&self, program: &str, cmd: &SimpleCommand) -> i32 {
        if let Err(err) = redirect::apply(cmd) {
            self.report_leaf(&err, cmd);
            return FAILURE_CODE;
        }

        let argv = match cmd.argv() {
            Ok(argv) => argv,
            Err(err) => {
                self.report_leaf(&err, cmd);
                return err.exit_code();
            }
        };

        let source = match execvp(&argv[0], argv.as_slice()) {
            Ok(never) => match never {},
            Err(errno) => errno,
        };
        let err = ExecError::Exec {
            program: program.to_string(),
            source,
        };
        self.report_leaf(&err, cmd);
        err.exit_code()
    }

    fn report_leaf(&self, err: &ExecError, cmd: &SimpleCommand) {
        debug!("{} failed before exec", cmd);
        eprintln!("{}", ErrorReport::from(err).render(self.config.error_format));
    }
}

use std::fs;

use crate::parser;
use crate::runtime::RuntimeError;

use super::Interpreter;

impl Interpreter {
    /// `取り込む "path"`: runs another source file in the current scope.
    /// Paths resolve against the configured module root and each file runs
    /// at most once per interpreter.
    pub(super) fn import(&mut self, path: &str) -> Result<(), RuntimeError> {
        let resolved = self.config.module_root.join(path);
        let key = resolved.canonicalize().unwrap_or_else(|_| resolved.clone());
        if !self.imported.insert(key) {
            tracing::debug!(path, "module already imported");
            return Ok(());
        }

        let bytes = fs::read(&resolved).map_err(|error| RuntimeError::ImportFailed {
            path: path.to_string(),
            reason: error.to_string(),
        })?;
        let source = String::from_utf8_lossy(&bytes);
        let program = parser::parse(&source).map_err(|errors| RuntimeError::ImportSyntax {
            path: path.to_string(),
            diagnostics: errors.to_string(),
        })?;

        tracing::debug!(
            path = %resolved.display(),
            statements = program.statements.len(),
            "importing module"
        );
        let saved_line = self.line;
        self.execute_block(&program.statements)?;
        self.line = saved_line;
        Ok(())
    }
}

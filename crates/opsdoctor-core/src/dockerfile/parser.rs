use std::path::{Path, PathBuf};

use crate::module::ModuleError;

/// One logical Dockerfile instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Upper-cased keyword (`FROM`, `RUN`, `USER`, ...).
    pub command: String,
    /// Trimmed remainder of the logical line.
    pub args: String,
    /// 1-based line of the instruction's first physical line.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDockerfile {
    pub path: PathBuf,
    pub instructions: Vec<Instruction>,
}

impl ParsedDockerfile {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ModuleError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ModuleError::io(path, source))?;
        Ok(Self::parse(path, &contents))
    }

    /// Parse Dockerfile text. Blank and `#` lines are skipped, backslash
    /// continuations are joined into a single instruction.
    pub fn parse(path: impl Into<PathBuf>, contents: &str) -> Self {
        let mut instructions = Vec::new();
        let mut pending: Option<(usize, String)> = None;

        for (idx, raw) in contents.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();

            if trimmed.starts_with('#') || (pending.is_none() && trimmed.is_empty()) {
                continue;
            }

            if let Some(body) = trimmed.strip_suffix('\\') {
                let (_, text) = pending.get_or_insert_with(|| (line_no, String::new()));
                text.push_str(body);
                text.push(' ');
                continue;
            }

            let (start, logical) = match pending.take() {
                Some((start, mut text)) => {
                    text.push_str(trimmed);
                    (start, text)
                }
                None => (line_no, trimmed.to_string()),
            };
            push_instruction(&mut instructions, start, &logical);
        }

        if let Some((start, text)) = pending {
            push_instruction(&mut instructions, start, &text);
        }

        Self {
            path: path.into(),
            instructions,
        }
    }

    pub fn instructions_named<'a>(
        &'a self,
        command: &'a str,
    ) -> impl Iterator<Item = &'a Instruction> + 'a {
        self.instructions
            .iter()
            .filter(move |instr| instr.command == command)
    }

    /// `<path>:line<N>` resource identifier for an instruction.
    pub fn location(&self, instr: &Instruction) -> String {
        format!("{}:line{}", self.path.display(), instr.line)
    }
}

fn push_instruction(instructions: &mut Vec<Instruction>, line: usize, logical: &str) {
    let logical = logical.trim();
    if logical.is_empty() {
        return;
    }
    let (command, args) = logical
        .split_once(char::is_whitespace)
        .unwrap_or((logical, ""));
    instructions.push(Instruction {
        command: command.to_ascii_uppercase(),
        args: args.trim().to_string(),
        line,
    });
}

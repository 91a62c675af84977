#[cfg(test)]
#[path = "slash_command_test.rs"]
mod tests;

/// A `/command arg...` typed into the chat prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommand {
    pub command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let trimmed = text.trim();
        if !trimmed.starts_with('/') || trimmed.len() < 2 {
            return None;
        }

        let mut parts = trimmed.split_whitespace();
        let command = parts.next()?.to_lowercase();
        let args = parts.map(|part| return part.to_string()).collect();

        return Some(SlashCommand { command, args });
    }

    fn is(&self, names: &[&str]) -> bool {
        return names.contains(&self.command.as_str());
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        return self.args.get(index).map(|arg| return arg.as_str());
    }

    /// 1-based numeric argument.
    pub fn number_arg(&self, index: usize) -> Option<usize> {
        return self
            .arg(index)
            .and_then(|arg| return arg.parse::<usize>().ok())
            .filter(|number| return *number > 0);
    }

    pub fn is_quit(&self) -> bool {
        return self.is(&["/quit", "/q", "/exit"]);
    }

    pub fn is_help(&self) -> bool {
        return self.is(&["/help", "/h"]);
    }

    pub fn is_about(&self) -> bool {
        return self.is(&["/about"]);
    }

    pub fn is_new(&self) -> bool {
        return self.is(&["/new", "/n"]);
    }

    pub fn is_sessions(&self) -> bool {
        return self.is(&["/sessions", "/s"]);
    }

    pub fn is_switch(&self) -> bool {
        return self.is(&["/switch"]);
    }

    pub fn is_reset(&self) -> bool {
        return self.is(&["/reset"]);
    }

    pub fn is_layers(&self) -> bool {
        return self.is(&["/layers", "/l"]);
    }

    pub fn is_docs(&self) -> bool {
        return self.is(&["/docs", "/d"]);
    }

    pub fn is_download(&self) -> bool {
        return self.is(&["/download"]);
    }

    pub fn is_delete(&self) -> bool {
        return self.is(&["/delete"]);
    }

    pub fn is_export(&self) -> bool {
        return self.is(&["/export", "/e"]);
    }

    pub fn is_retry(&self) -> bool {
        return self.is(&["/retry", "/r"]);
    }
}

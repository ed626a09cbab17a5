#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    CheckText,
    CheckBlocks,
    GlossaryLoad,
    GlossaryCoverage,
    CacheOpen,
    CacheSave,
    CacheUpdateBlock,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "check_text" => Command::CheckText,
            "check_blocks" => Command::CheckBlocks,
            "glossary.load" => Command::GlossaryLoad,
            "glossary.coverage" => Command::GlossaryCoverage,
            "cache.open" => Command::CacheOpen,
            "cache.save" => Command::CacheSave,
            "cache.update_block" => Command::CacheUpdateBlock,
            _ => Command::Unknown,
        }
    }
}

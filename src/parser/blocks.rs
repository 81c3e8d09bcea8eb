/// Configuration text scoped to one `interface` stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceBlock {
    pub name: String,
    /// The stanza including its `interface` header line.
    pub text: String,
}

/// Split a full running configuration into interface stanzas.
///
/// A stanza starts at a non-indented `interface <name>` line and runs until
/// the next non-indented line. Everything outside a stanza is dropped.
pub fn split_interface_blocks(config: &str) -> Vec<InterfaceBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<InterfaceBlock> = None;

    for line in config.lines() {
        let line = line.trim_end_matches('\r');
        let indented = line.starts_with(' ') || line.starts_with('\t');

        if indented {
            if let Some(block) = current.as_mut() {
                block.text.push_str(line);
                block.text.push('\n');
            }
            continue;
        }

        if let Some(block) = current.take() {
            blocks.push(block);
        }

        if let Some(name) = interface_header(line) {
            current = Some(InterfaceBlock {
                name: name.to_string(),
                text: format!("{line}\n"),
            });
        }
    }

    if let Some(block) = current {
        blocks.push(block);
    }

    blocks
}

fn interface_header(line: &str) -> Option<&str> {
    let mut tokens = line.split_whitespace();
    let keyword = tokens.next()?;
    if !keyword.eq_ignore_ascii_case("interface") {
        return None;
    }
    let name = tokens.next()?;
    Some(name)
}

//! Rendering one subroutine to file content.

use funcpack_ir::{Program, RenderError, Subroutine, Usage};

/// Marker line prepended to keep-marked subroutines the optimizer proved
/// unreachable.
const UNUSED_MARKER: &str = "# unused";

/// Render a subroutine's body to its file content: one line per expanded
/// instruction, newline-terminated.
///
/// A dead subroutine only reaches here under a keep override; its file
/// opens with a marker line so readers know no hook path leads to it.
/// Any instruction failing to render aborts this whole unit — a partial
/// function file would silently change runtime behavior.
pub fn render_subroutine(sub: &Subroutine, program: &Program) -> Result<String, RenderError> {
    let mut lines = Vec::with_capacity(sub.instruction_count());
    if sub.keep && sub.usage == Usage::Dead {
        lines.push(UNUSED_MARKER.to_string());
    }
    for instr in sub.instructions() {
        lines.extend(instr.render(program)?);
    }
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use funcpack_ir::{Instruction, SubroutineId};

    fn program_with(sub: Subroutine) -> (Program, SubroutineId) {
        let id = sub.id.clone();
        let mut program = Program::new();
        let idx = program.declare(id.clone());
        *program.get_mut(idx) = sub;
        (program, id)
    }

    #[test]
    fn test_body_renders_newline_terminated() {
        let mut sub = Subroutine::new(SubroutineId::new("pack", ["main"]));
        sub.push(Instruction::line("say one"));
        sub.push(Instruction::line("say two"));
        let (program, id) = program_with(sub);
        let content = render_subroutine(program.by_id(&id).unwrap(), &program).unwrap();
        assert_eq!(content, "say one\nsay two\n");
    }

    #[test]
    fn test_empty_body_renders_empty() {
        let sub = Subroutine::new(SubroutineId::new("pack", ["main"]));
        let (program, id) = program_with(sub);
        let content = render_subroutine(program.by_id(&id).unwrap(), &program).unwrap();
        assert_eq!(content, "");
    }

    #[test]
    fn test_dead_kept_body_is_marked_unused() {
        let mut sub = Subroutine::new(SubroutineId::new("pack", ["debug"]));
        sub.push(Instruction::line("say debug"));
        sub.usage = Usage::Dead;
        sub.keep = true;
        let (program, id) = program_with(sub);
        let content = render_subroutine(program.by_id(&id).unwrap(), &program).unwrap();
        assert_eq!(content, "# unused\nsay debug\n");
    }

    #[test]
    fn test_live_kept_body_has_no_marker() {
        let mut sub = Subroutine::new(SubroutineId::new("pack", ["main"]));
        sub.push(Instruction::line("say hi"));
        sub.usage = Usage::Live;
        sub.keep = true;
        let (program, id) = program_with(sub);
        let content = render_subroutine(program.by_id(&id).unwrap(), &program).unwrap();
        assert_eq!(content, "say hi\n");
    }
}

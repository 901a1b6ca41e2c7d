use crate::bytecode::{Addr, Instr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stack-check error at ip={ip}: {message}")]
pub struct StackCheckError {
    pub ip: usize,
    pub message: String,
}

impl StackCheckError {
    fn new(ip: usize, message: impl Into<String>) -> Self {
        Self {
            ip,
            message: message.into(),
        }
    }
}

/// Abstract stack at one program point of a supercombinator body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    /// Current height, counting the call frame's spine.
    height: usize,
    /// Slots at the bottom still holding the spine (function ref + one
    /// application per argument); `None` once a SLIDE has collapsed it.
    spine: Option<usize>,
}

enum Flow {
    FallThrough(Frame),
    Exit,
}

/// Returns (pops, pushes) for the instructions with a fixed effect.
fn effect(instr: &Instr) -> Option<(usize, usize)> {
    Some(match instr {
        Instr::Push(_) => (0, 1),
        Instr::Mkap => (2, 1),
        Instr::Slide(n) => (n.saturating_add(1), 1),
        Instr::Eval => (1, 1),
        Instr::Add | Instr::Sub | Instr::Mul | Instr::Div | Instr::Equ => (2, 1),
        Instr::Cond { .. } | Instr::Unwind => return None,
    })
}

/// Statically check a supercombinator body of the given arity.
///
/// Verifies that no instruction underflows the stack, that `PUSH ARG`
/// addresses an application of the entry spine, that `PUSH LOCAL` stays
/// inside the stack, that both COND branches leave the same height, and that
/// every path ends in UNWIND. Returns the maximum stack height reached.
pub fn check_code(arity: usize, code: &[Instr]) -> Result<usize, StackCheckError> {
    let entry = Frame {
        height: arity.saturating_add(1),
        spine: Some(arity.saturating_add(1)),
    };
    let mut max_height = entry.height;

    match simulate(code, entry, 0, &mut max_height)? {
        Flow::Exit => Ok(max_height),
        Flow::FallThrough(_) => Err(StackCheckError::new(
            code.len(),
            "code falls off the end without UNWIND",
        )),
    }
}

fn simulate(
    code: &[Instr],
    mut frame: Frame,
    base_ip: usize,
    max_height: &mut usize,
) -> Result<Flow, StackCheckError> {
    for (offset, instr) in code.iter().enumerate() {
        let ip = base_ip + offset;

        if let Instr::Push(addr) = instr {
            check_addr(ip, *addr, frame)?;
        }

        match instr {
            Instr::Unwind => {
                if frame.height == 0 {
                    return Err(StackCheckError::new(ip, "UNWIND on an empty stack"));
                }
                return Ok(Flow::Exit);
            }
            Instr::Cond {
                then_code,
                else_code,
            } => {
                if frame.height == 0 {
                    return Err(StackCheckError::new(ip, "COND needs a scrutinee"));
                }
                frame.height -= 1;
                let then_flow = simulate(then_code, frame, ip, max_height)?;
                let else_flow = simulate(else_code, frame, ip, max_height)?;
                frame = match (then_flow, else_flow) {
                    (Flow::Exit, Flow::Exit) => return Ok(Flow::Exit),
                    (Flow::FallThrough(f), Flow::Exit) | (Flow::Exit, Flow::FallThrough(f)) => f,
                    (Flow::FallThrough(t), Flow::FallThrough(e)) => {
                        if t.height != e.height {
                            return Err(StackCheckError::new(
                                ip,
                                format!(
                                    "COND branches disagree on stack height ({} vs {})",
                                    t.height, e.height
                                ),
                            ));
                        }
                        t
                    }
                };
            }
            other => {
                if let Some((pops, pushes)) = effect(other) {
                    if frame.height < pops {
                        return Err(StackCheckError::new(
                            ip,
                            format!(
                                "stack underflow, op={}, needed {} items, have {}",
                                other, pops, frame.height
                            ),
                        ));
                    }
                    frame.height = frame.height - pops + pushes;

                    if let Instr::Slide(_) = other {
                        frame.spine = None;
                    } else if let Some(spine) = frame.spine {
                        // the spine itself must never be consumed
                        if frame.height - pushes < spine {
                            return Err(StackCheckError::new(
                                ip,
                                format!("{} consumes the call frame's spine", other),
                            ));
                        }
                    }
                }
            }
        }

        *max_height = (*max_height).max(frame.height);
    }

    Ok(Flow::FallThrough(frame))
}

fn check_addr(ip: usize, addr: Addr, frame: Frame) -> Result<(), StackCheckError> {
    match addr {
        Addr::Arg(n) => {
            let Some(spine) = frame.spine else {
                return Err(StackCheckError::new(
                    ip,
                    format!("PUSH ARG {} after the spine was slid away", n),
                ));
            };
            // applications occupy slots height-spine+1 ..= height-1 from the top
            let slot = n.saturating_add(1);
            let lowest = frame.height - spine + 1;
            if slot < lowest || slot >= frame.height {
                return Err(StackCheckError::new(
                    ip,
                    format!(
                        "PUSH ARG {} does not address an argument (valid offsets {}..={})",
                        n,
                        lowest.saturating_sub(1),
                        frame.height.saturating_sub(2)
                    ),
                ));
            }
            Ok(())
        }
        Addr::Local(n) if n >= frame.height => Err(StackCheckError::new(
            ip,
            format!("PUSH LOCAL {} beyond stack height {}", n, frame.height),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::GlobalId;

    #[test]
    fn test_simple_body() {
        // f x = x
        let code = vec![Instr::push_arg(0), Instr::Slide(2), Instr::Unwind];
        assert_eq!(check_code(1, &code), Ok(3));
    }

    #[test]
    fn test_underflow() {
        let result = check_code(0, &[Instr::Add, Instr::Unwind]);
        assert!(result.is_err());
        assert!(result.unwrap_err().message.contains("underflow"));
    }

    #[test]
    fn test_arg_offset_outside_spine() {
        // arity 1: only ARG 0 is valid at entry
        let err = check_code(1, &[Instr::push_arg(1), Instr::Unwind]).unwrap_err();
        assert_eq!(err.ip, 0);
        assert!(err.message.contains("PUSH ARG 1"));
    }

    #[test]
    fn test_arg_offset_tracks_pushes() {
        // after one push, argument 0 lives at ARG 1
        let ok = vec![
            Instr::push_global(GlobalId(0)),
            Instr::push_arg(1),
            Instr::Mkap,
            Instr::Slide(2),
            Instr::Unwind,
        ];
        assert!(check_code(1, &ok).is_ok());

        let stale = vec![
            Instr::push_global(GlobalId(0)),
            Instr::push_arg(0),
            Instr::Mkap,
            Instr::Slide(2),
            Instr::Unwind,
        ];
        assert!(check_code(1, &stale).is_err());
    }

    #[test]
    fn test_arg_after_slide() {
        let code = vec![
            Instr::push_arg(0),
            Instr::Slide(2),
            Instr::push_arg(0),
            Instr::Unwind,
        ];
        let err = check_code(1, &code).unwrap_err();
        assert_eq!(err.ip, 2);
    }

    #[test]
    fn test_local_bounds() {
        assert!(check_code(0, &[Instr::push_local(0), Instr::Unwind]).is_ok());
        assert!(check_code(0, &[Instr::push_local(1), Instr::Unwind]).is_err());
    }

    #[test]
    fn test_huge_offsets_are_rejected() {
        let slide = check_code(1, &[Instr::Slide(usize::MAX), Instr::Unwind]).unwrap_err();
        assert!(slide.message.contains("underflow"));

        let arg = check_code(1, &[Instr::push_arg(usize::MAX), Instr::Unwind]).unwrap_err();
        assert!(arg.message.contains("does not address an argument"));
    }

    #[test]
    fn test_mkap_cannot_eat_spine() {
        // arity 1 frame is [f, app]; MKAP would fuse them
        assert!(check_code(1, &[Instr::Mkap, Instr::Unwind]).is_err());
    }

    #[test]
    fn test_cond_branches_must_agree() {
        let code = vec![
            Instr::push_literal(1),
            Instr::Cond {
                then_code: vec![Instr::push_literal(1)],
                else_code: vec![],
            },
            Instr::Unwind,
        ];
        let err = check_code(0, &code).unwrap_err();
        assert!(err.message.contains("disagree"));
    }

    #[test]
    fn test_missing_unwind() {
        let err = check_code(0, &[Instr::push_literal(1)]).unwrap_err();
        assert!(err.message.contains("without UNWIND"));
    }

    #[test]
    fn test_max_height() {
        let code = vec![
            Instr::push_literal(1),
            Instr::push_literal(2),
            Instr::push_literal(3),
            Instr::Add,
            Instr::Add,
            Instr::Slide(1),
            Instr::Unwind,
        ];
        assert_eq!(check_code(0, &code), Ok(4));
    }
}

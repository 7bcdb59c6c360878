// src/models/lifecycle.rs

use crate::common::error::AppError;

/// Máquina de estados baseada em tabela de transições.
///
/// Cada enum de status declara, para cada estado, a lista de destinos
/// permitidos. Estados sem destinos são terminais.
pub trait StatusMachine: Copy + PartialEq + 'static {
    fn allowed_transitions(self) -> &'static [Self];

    fn code(self) -> &'static str;

    fn can_transition_to(self, next: Self) -> bool {
        self.allowed_transitions().contains(&next)
    }

    fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    fn ensure_transition(self, next: Self) -> Result<(), AppError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                from: self.code().to_string(),
                to: next.code().to_string(),
            })
        }
    }
}

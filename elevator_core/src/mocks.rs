//! Helper collaborators for elevator_core

/// Display that discards everything; the default when no display is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDisplay;

impl elevator_traits::Display for NoDisplay {
    fn show_floor_label(
        &mut self,
        _label: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn show_distance(&mut self, _mm: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

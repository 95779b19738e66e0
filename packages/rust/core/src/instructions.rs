//! Instruction rendering.

use larder_catalog::Recipe;

/// Expands a recipe into its ordered steps.
pub struct InstructionRenderer;

impl InstructionRenderer {
    /// The recipe's steps, in their original order.
    pub fn render(recipe: &Recipe) -> Vec<String> {
        recipe.instructions().to_vec()
    }
}

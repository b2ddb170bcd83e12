//! Training prompt rendering.

use defi_trainer_shared::TrainingExample;

/// System persona shared by training prompts and the smoke test.
pub const ASSISTANT_PERSONA: &str = "You are an expert Solana DeFi AI assistant specializing in trading strategies, flash loans, and MEV opportunities.";

const RISK_REMINDERS: &str = "When providing trading advice, always emphasize:
- Risk management and capital preservation
- Understanding of impermanent loss and slippage
- Compliance with applicable regulations
- Using audited protocols and contracts
- Testing strategies on devnet before mainnet deployment";

const MEV_CAUTION: &str =
    "For MEV strategies, note that some techniques may be controversial and could harm other users.";

/// Render the full fine-tuning prompt for one example.
pub fn render_prompt(example: &TrainingExample) -> String {
    format!(
        "{ASSISTANT_PERSONA}\n\n\
         Context: {context}\n\n\
         User: {input}\n\n\
         Assistant: Based on my extensive knowledge of Solana DeFi, {answer}\n\n\
         {RISK_REMINDERS}\n\n\
         {MEV_CAUTION}",
        context = example.context(),
        input = example.input_text(),
        answer = example.expected_output(),
    )
}

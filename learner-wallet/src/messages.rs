//! User-facing text for ledger outcome tags.

use reward_ledger::ErrorTag;

/// Message shown to the learner for a rejected intent.
pub fn user_message(tag: ErrorTag) -> &'static str {
    match tag {
        ErrorTag::AlreadyClaimed => "You've already claimed the reward for this lesson.",
        ErrorTag::InsufficientPoints => "Not enough Learning Points.",
        ErrorTag::InsufficientStake => "You don't have that many points staked.",
        ErrorTag::InsufficientFunds => "Insufficient balance.",
        ErrorTag::BelowMinimum => "Amount is below the minimum withdrawal.",
        ErrorTag::MethodNotLinked => "Link this payout method before withdrawing.",
        ErrorTag::VerificationRequired => "Identity verification is required for this amount.",
        ErrorTag::InvalidRecipient => "Check the recipient and try again.",
        ErrorTag::InvalidAmount => "Enter an amount greater than zero.",
        ErrorTag::UnknownAccount => "Account not found.",
        ErrorTag::Internal => "Something went wrong. Please try again.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tag_has_text() {
        let tags = [
            ErrorTag::AlreadyClaimed,
            ErrorTag::InsufficientPoints,
            ErrorTag::InsufficientStake,
            ErrorTag::InsufficientFunds,
            ErrorTag::BelowMinimum,
            ErrorTag::MethodNotLinked,
            ErrorTag::VerificationRequired,
            ErrorTag::InvalidRecipient,
            ErrorTag::InvalidAmount,
            ErrorTag::UnknownAccount,
            ErrorTag::Internal,
        ];
        for tag in tags {
            assert!(!user_message(tag).is_empty());
        }
    }
}

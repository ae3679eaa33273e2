
#[cfg(test)]
mod token_tests {
    use crate::memory::MemoryToken;
    use crate::{Address, TokenLedger};

    #[test]
    fn test_sets_name_and_symbol() {
        let token = MemoryToken::new("Test token", "TKN", 31337, Address::new([1; 20]));

        assert_eq!(token.name(), "Test token");
        assert_eq!(token.symbol(), "TKN");
    }

    #[test]
    fn test_mints_initial_supply_to_deployer() {
        let owner = Address::new([1; 20]);
        let token = MemoryToken::new("Test token", "TKN", 31337, owner);

        assert_eq!(token.total_supply(), 31337);
        assert_eq!(token.balance_of(&owner), 31337);
        assert_eq!(token.balance_of(&Address::new([2; 20])), 0);
    }
}

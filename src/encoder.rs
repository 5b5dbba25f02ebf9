//! Instruction encoding for the bonding-curve program.
//!
//! The account order, signer/writable flags, and payload byte layout are the
//! program's calling convention. Any deviation is rejected on chain, not
//! client-side, so everything here is reproduced bit-exact. Construction is
//! pure; no I/O.

use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;
use solana_sdk::sysvar::rent;
use spl_associated_token_account::get_associated_token_address;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;

use crate::constants::{ProtocolAddresses, BUY_DISCRIMINATOR, CREATE_DISCRIMINATOR};
use crate::market::MarketState;
use crate::sizer::BuyOrder;

/// Compute-budget preamble: unit price first, then unit limit.
pub fn compute_budget_pair(price_micro_lamports: u64, unit_limit: u32) -> [Instruction; 2] {
    [
        ComputeBudgetInstruction::set_compute_unit_price(price_micro_lamports),
        ComputeBudgetInstruction::set_compute_unit_limit(unit_limit),
    ]
}

/// Builds buy and create instructions against one resolved address set.
#[derive(Debug, Clone)]
pub struct InstructionEncoder {
    addresses: ProtocolAddresses,
}

impl InstructionEncoder {
    pub fn new(addresses: ProtocolAddresses) -> Self {
        Self { addresses }
    }

    pub fn addresses(&self) -> &ProtocolAddresses {
        &self.addresses
    }

    /// The buyer's token account for this mint.
    pub fn buyer_token_account(&self, buyer: &Pubkey, mint: &Pubkey) -> Pubkey {
        get_associated_token_address(buyer, mint)
    }

    /// Full per-wallet buy sequence: idempotent token-account creation first,
    /// then the buy itself. The ATA instruction is a no-op when the account
    /// already exists, so it is always emitted.
    pub fn buy(&self, order: &BuyOrder, market: &MarketState, buyer: &Pubkey) -> Vec<Instruction> {
        let ata = create_associated_token_account_idempotent(
            buyer,
            buyer,
            &market.mint,
            &spl_token::id(),
        );
        vec![ata, self.buy_instruction(order, market, buyer)]
    }

    /// The buy instruction alone: 12 accounts in the program's fixed order,
    /// 24 payload bytes (`discriminator || expected_output || max_cost`,
    /// each u64 little-endian).
    pub fn buy_instruction(
        &self,
        order: &BuyOrder,
        market: &MarketState,
        buyer: &Pubkey,
    ) -> Instruction {
        let buyer_ata = self.buyer_token_account(buyer, &market.mint);
        let accounts = vec![
            AccountMeta::new_readonly(self.addresses.global, false),
            AccountMeta::new(self.addresses.fee_recipient, false),
            AccountMeta::new_readonly(market.mint, false),
            AccountMeta::new(market.bonding_curve, false),
            AccountMeta::new(market.associated_bonding_curve, false),
            AccountMeta::new(buyer_ata, false),
            AccountMeta::new(*buyer, true),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(rent::id(), false),
            AccountMeta::new_readonly(self.addresses.event_authority, false),
            AccountMeta::new_readonly(self.addresses.program, false),
        ];

        let mut data = Vec::with_capacity(24);
        data.extend_from_slice(&BUY_DISCRIMINATOR.to_le_bytes());
        data.extend_from_slice(&order.expected_output.to_le_bytes());
        data.extend_from_slice(&order.max_cost.to_le_bytes());

        Instruction {
            program_id: self.addresses.program,
            accounts,
            data,
        }
    }

    /// The mint-creation instruction: 14 accounts, payload is the create
    /// discriminator followed by three u32-length-prefixed UTF-8 strings.
    pub fn create_instruction(
        &self,
        mint: &Pubkey,
        payer: &Pubkey,
        name: &str,
        ticker: &str,
        metadata_uri: &str,
    ) -> Instruction {
        let bonding_curve = self.addresses.bonding_curve(mint);
        let associated_bonding_curve = self.addresses.associated_bonding_curve(mint);
        let metadata = self.addresses.metadata_account(mint);

        let accounts = vec![
            AccountMeta::new(*mint, true),
            AccountMeta::new_readonly(self.addresses.mint_authority, false),
            AccountMeta::new(bonding_curve, false),
            AccountMeta::new(associated_bonding_curve, false),
            AccountMeta::new_readonly(self.addresses.global, false),
            AccountMeta::new_readonly(self.addresses.metadata_program, false),
            AccountMeta::new(metadata, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(rent::id(), false),
            AccountMeta::new_readonly(self.addresses.event_authority, false),
            AccountMeta::new_readonly(self.addresses.program, false),
        ];

        let mut data = Vec::with_capacity(8 + 12 + name.len() + ticker.len() + metadata_uri.len());
        data.extend_from_slice(&CREATE_DISCRIMINATOR);
        push_str(&mut data, name);
        push_str(&mut data, ticker);
        push_str(&mut data, metadata_uri);

        Instruction {
            program_id: self.addresses.program,
            accounts,
            data,
        }
    }
}

fn push_str(data: &mut Vec<u8>, value: &str) {
    data.extend_from_slice(&(value.len() as u32).to_le_bytes());
    data.extend_from_slice(value.as_bytes());
}

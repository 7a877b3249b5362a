//! End-to-end tests of the default Cosmos and Ethereum chains.

use std::rc::Rc;

use alloy_primitives::{Address, U256};
use evm_ante::{
    test_utils::{
        ethereum_tx, init_tracing, CosmosTxBuilder, EthTxBuilder, MemoryAccountKeeper,
        MemoryFeeMarket, TestEnv, TestSigner, TEST_CHAIN_ID,
    },
    AccountKeeper, AnteError, AnteHandler, AnteOptions, BankKeeper, Coin, Coins, Context, ExecMode,
    ExtensionOption, FeeMarketParams, Msg, MsgSend, OpaqueTx, SdkTx, SignMode, Tx,
};
use rstest::rstest;

const DENOM: &str = "aevm";
const BOB: Address = Address::repeat_byte(0xb0);

fn alice() -> TestSigner {
    TestSigner::ed25519(0x01)
}

fn send(from: Address) -> Msg {
    MsgSend { from, to: BOB, amount: Coins::single(DENOM, U256::from(1u64)) }.into()
}

fn env() -> Rc<TestEnv> {
    init_tracing();
    let accounts = MemoryAccountKeeper::default()
        .with_balance(alice().address(), DENOM, U256::from(1_000_000u64))
        .with_balance(Address::repeat_byte(0xaa), DENOM, U256::from(10u64).pow(U256::from(18)));
    Rc::new(TestEnv::new(accounts, MemoryFeeMarket::new(FeeMarketParams::default())))
}

fn ctx() -> Context {
    Context::new(TEST_CHAIN_ID, 10, 1_000)
}

fn send_tx() -> SdkTx {
    CosmosTxBuilder::new([send(alice().address())])
        .fee(Coins::single(DENOM, U256::from(200_000u64)), 200_000)
        .tx_size(100)
        .build()
}

#[test]
fn test_stage_order() {
    let handler = AnteHandler::new(env(), AnteOptions::default());
    assert_eq!(
        handler.cosmos_stages(),
        vec![
            "setup",
            "reject_ethereum_msgs",
            "extension_options",
            "validate_basic",
            "tx_timeout_height",
            "validate_memo",
            "consume_tx_size_gas",
            "nested_msgs",
            "min_gas_price",
            "mempool_fee",
            "gas_wanted",
            "validate_sig_count",
            "sig_gas_consume",
            "sig_verification",
            "increment_sequence",
            "deduct_fee",
        ]
    );
    assert_eq!(
        handler.ethereum_stages(),
        vec![
            "eth_setup",
            "eth_validate_basic",
            "nested_msgs",
            "eth_mempool_fee",
            "eth_min_gas_price",
            "gas_wanted",
            "eth_sig_verification",
            "eth_vesting",
            "eth_increment_sequence",
            "eth_deduct_fee",
        ]
    );
}

#[test]
fn test_cosmos_tx_admitted() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let alice = alice();
    let tx = env.sign_cosmos_tx(send_tx(), &[&alice], SignMode::Direct);

    let mut ctx = ctx();
    handler.ante_handle(&mut ctx, &tx, false).unwrap();

    // tx size then one ed25519 signature
    assert_eq!(ctx.gas_meter.consumed(), 10 * 100 + 590);
    assert_eq!(ctx.gas_meter.limit(), 200_000);
    assert_eq!(ctx.transient.gas_wanted, 200_000);
    assert_eq!(env.accounts.sequence(alice.address()), Some(1));
    assert_eq!(env.accounts.account(alice.address()).unwrap().pub_key, Some(alice.pub_key()));
    assert_eq!(env.accounts.balance(alice.address(), DENOM), U256::from(800_000));
    assert_eq!(env.accounts.collected_fees(DENOM), U256::from(200_000));
}

#[test]
fn test_tampered_memo_rejected_and_rolled_back() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let Tx::Cosmos(mut tx) = env.sign_cosmos_tx(send_tx(), &[&alice()], SignMode::Direct)
    else {
        unreachable!()
    };
    tx.memo = "tampered".to_string();

    let mut ctx = ctx();
    let rejection = handler.ante_handle(&mut ctx, &Tx::Cosmos(tx), false).unwrap_err();
    assert_eq!(rejection.stage, "sig_verification");
    assert!(matches!(rejection.error, AnteError::TamperedAfterSigning { sequence: 0, .. }));
    assert_eq!(rejection.code(), 4);
    assert_eq!(rejection.gas_used, 10 * 100 + 590);
    assert_eq!(ctx, self::ctx());
    assert_eq!(env.accounts.sequence(alice().address()), Some(0));
}

#[test]
fn test_simulation_skips_signature_bytes() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let Tx::Cosmos(mut tx) = env.sign_cosmos_tx(send_tx(), &[&alice()], SignMode::Direct)
    else {
        unreachable!()
    };
    tx.memo = "unsigned".to_string();

    let mut ctx = ctx();
    handler.ante_handle(&mut ctx, &Tx::Cosmos(tx), true).unwrap();
    assert!(ctx.gas_meter.is_infinite());
    assert_eq!(ctx.transient.gas_wanted, 0);
    // simulations only check that the fee is affordable
    assert_eq!(env.accounts.balance(alice().address(), DENOM), U256::from(1_000_000));
}

#[test]
fn test_wrong_sequence() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let mut tx = env.sign_cosmos_tx(send_tx(), &[&alice()], SignMode::Direct);
    if let Tx::Cosmos(tx) = &mut tx {
        tx.signatures[0].sequence = 3;
    }
    let rejection = handler.ante_handle(&mut ctx(), &tx, false).unwrap_err();
    assert_eq!(rejection.stage, "sig_verification");
    assert_eq!(rejection.error, AnteError::WrongSequence { expected: 0, got: 3 });
}

#[test]
fn test_recheck_skips_signature_bytes() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let Tx::Cosmos(mut tx) = env.sign_cosmos_tx(send_tx(), &[&alice()], SignMode::Direct)
    else {
        unreachable!()
    };
    tx.memo = "unsigned".to_string();

    let mut ctx = ctx().with_exec_mode(ExecMode::ReCheck);
    handler.ante_handle(&mut ctx, &Tx::Cosmos(tx.clone()), false).unwrap();

    let mut ctx = self::ctx().with_exec_mode(ExecMode::Deliver);
    tx.signatures[0].sequence = 1;
    let rejection = handler.ante_handle(&mut ctx, &Tx::Cosmos(tx), false).unwrap_err();
    assert!(matches!(rejection.error, AnteError::TamperedAfterSigning { .. }));
}

#[rstest]
#[case::opaque(Tx::Opaque(OpaqueTx::default()), "setup")]
#[case::no_msgs(Tx::Cosmos(SdkTx::default()), "validate_basic")]
#[case::memo(
    Tx::Cosmos(CosmosTxBuilder::new([send(alice().address())]).memo("m".repeat(257)).build()),
    "validate_basic"
)]
#[case::unknown_option(
    Tx::Cosmos(
        CosmosTxBuilder::new([send(alice().address())])
            .extension_option(ExtensionOption::Unknown { type_url: "/x.Option".to_string() })
            .build()
    ),
    "extension_options"
)]
fn test_malformed_cosmos_tx(#[case] tx: Tx, #[case] stage: &str) {
    let handler = AnteHandler::new(env(), AnteOptions::default());
    let rejection = handler.ante_handle(&mut ctx(), &tx, false).unwrap_err();
    assert_eq!(rejection.stage, stage);
    assert_eq!(rejection.gas_used, 0);
}

#[rstest]
#[case::duplicate(vec![Coin::new(DENOM, U256::from(100_000u64)), Coin::new(DENOM, U256::from(100_000u64))])]
#[case::unsorted(vec![Coin::new("stake", U256::from(1u64)), Coin::new(DENOM, U256::from(200_000u64))])]
fn test_cosmos_fee_coins_must_be_sorted(#[case] coins: Vec<Coin>) {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let mut tx = send_tx();
    tx.fee.amount = Coins::new(coins);
    let tx = env.sign_cosmos_tx(tx, &[&alice()], SignMode::Direct);
    let rejection = handler.ante_handle(&mut ctx(), &tx, false).unwrap_err();
    assert_eq!(rejection.stage, "validate_basic");
    assert!(matches!(rejection.error, AnteError::InvalidCoins(_)), "{}", rejection.error);
    assert_eq!(rejection.code(), 10);
}

#[test]
fn test_memo_too_long() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let body = CosmosTxBuilder::new([send(alice().address())])
        .fee(Coins::single(DENOM, U256::from(200_000u64)), 200_000)
        .memo("m".repeat(257))
        .build();
    let tx = env.sign_cosmos_tx(body, &[&alice()], SignMode::Direct);
    let rejection = handler.ante_handle(&mut ctx(), &tx, false).unwrap_err();
    assert_eq!(rejection.stage, "validate_memo");
    assert_eq!(rejection.error, AnteError::MemoTooLong { max: 256, len: 257 });
}

#[test]
fn test_timeout_height() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let body = CosmosTxBuilder::new([send(alice().address())])
        .fee(Coins::single(DENOM, U256::from(200_000u64)), 200_000)
        .timeout_height(9)
        .build();
    let tx = env.sign_cosmos_tx(body, &[&alice()], SignMode::Direct);
    let rejection = handler.ante_handle(&mut ctx(), &tx, false).unwrap_err();
    assert_eq!(rejection.error, AnteError::TxTimeoutHeight { height: 10, timeout: 9 });
}

#[test]
fn test_out_of_gas_on_tx_size() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let body = CosmosTxBuilder::new([send(alice().address())])
        .fee(Coins::single(DENOM, U256::from(500u64)), 500)
        .tx_size(100)
        .build();
    let tx = env.sign_cosmos_tx(body, &[&alice()], SignMode::Direct);
    let rejection = handler.ante_handle(&mut ctx(), &tx, false).unwrap_err();
    assert_eq!(rejection.stage, "consume_tx_size_gas");
    assert!(rejection.error.is_out_of_gas());
    assert_eq!(rejection.gas_used, 0);
}

#[rstest]
#[case::matching_chain(Some(1291), None)]
#[case::other_chain(Some(9000), Some(AnteError::InvalidChainId { got: 9000, expected: 1291 }))]
#[case::missing_option(
    None,
    Some(AnteError::ExtensionOptionMissing(evm_ante::constants::type_urls::EXTENSION_OPTIONS_WEB3_TX))
)]
fn test_eip712_domain(#[case] typed_data_chain_id: Option<u64>, #[case] expected: Option<AnteError>) {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let mut body =
        CosmosTxBuilder::new([send(alice().address())]).fee(Coins::single(DENOM, U256::from(200_000u64)), 200_000);
    if let Some(typed_data_chain_id) = typed_data_chain_id {
        body = body
            .extension_option(ExtensionOption::Web3Tx { typed_data_chain_id, fee_payer: None });
    }
    let tx = env.sign_cosmos_tx(body.build(), &[&alice()], SignMode::Eip712);
    let result = handler.ante_handle(&mut ctx(), &tx, false).map_err(|rejection| rejection.error);
    assert_eq!(result.err(), expected);
}

#[test]
fn test_multisig_below_threshold() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let members = [TestSigner::ed25519(0x11), TestSigner::ed25519(0x12), TestSigner::ed25519(0x13)];
    let multisig = TestSigner::multisig(Address::repeat_byte(0x10), 2, &members, [1]);
    env.accounts.set_balance(multisig.address(), DENOM, U256::from(1_000_000u64));

    let body = CosmosTxBuilder::new([send(multisig.address())])
        .fee(Coins::single(DENOM, U256::from(200_000u64)), 200_000)
        .build();
    let tx = env.sign_cosmos_tx(body.clone(), &[&multisig], SignMode::Direct);
    let rejection = handler.ante_handle(&mut ctx(), &tx, false).unwrap_err();
    assert_eq!(rejection.stage, "sig_verification");
    assert_eq!(rejection.gas_used, 590);

    let multisig = TestSigner::multisig(multisig.address(), 2, &members, [0, 2]);
    let tx = env.sign_cosmos_tx(body, &[&multisig], SignMode::Direct);
    let mut ctx = ctx();
    handler.ante_handle(&mut ctx, &tx, false).unwrap();
    assert_eq!(ctx.gas_meter.consumed(), 2 * 590);
}

#[test]
fn test_too_many_signatures() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let members: Vec<_> = (0x20..0x28).map(TestSigner::ed25519).collect();
    let multisig = TestSigner::multisig(Address::repeat_byte(0x1f), 1, &members, [0]);
    env.accounts.set_balance(multisig.address(), DENOM, U256::from(1_000_000u64));

    let body = CosmosTxBuilder::new([send(multisig.address())])
        .fee(Coins::single(DENOM, U256::from(200_000u64)), 200_000)
        .build();
    let tx = env.sign_cosmos_tx(body, &[&multisig], SignMode::Direct);
    let rejection = handler.ante_handle(&mut ctx(), &tx, false).unwrap_err();
    assert_eq!(rejection.stage, "validate_sig_count");
    assert_eq!(rejection.error, AnteError::TooManySignatures { count: 8, limit: 7 });
}

#[test]
fn test_cosmos_tx_rejects_ethereum_msgs() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let msg = env.signed_eth_msg(EthTxBuilder::legacy(Address::repeat_byte(0xaa), 1));
    let tx = Tx::Cosmos(CosmosTxBuilder::new([Msg::from(msg)]).build());
    let rejection = handler.ante_handle(&mut ctx(), &tx, false).unwrap_err();
    assert_eq!(rejection.stage, "reject_ethereum_msgs");
    assert!(matches!(rejection.error, AnteError::InvalidMessageType { .. }));
}

const SENDER: Address = Address::repeat_byte(0xaa);

#[test]
fn test_ethereum_tx_admitted() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let msg = env.signed_eth_msg(
        EthTxBuilder::dynamic(SENDER, 1_000_000_000, 3_000_000_000).value(U256::from(1_000u64)),
    );
    let tx = ethereum_tx([msg]);

    let mut ctx = ctx();
    handler.ante_handle(&mut ctx, &tx, false).unwrap();

    // min(tip + base fee, fee cap) = 2 gwei
    let fee = U256::from(2_000_000_000u64 * 21_000);
    assert_eq!(env.accounts.collected_fees(DENOM), fee);
    assert_eq!(
        env.accounts.balance(SENDER, DENOM),
        U256::from(10u64).pow(U256::from(18)) - fee
    );
    assert_eq!(env.accounts.sequence(SENDER), Some(1));
    assert_eq!(ctx.transient.gas_wanted, 21_000);
    assert_eq!(ctx.gas_meter.consumed(), 0);
}

#[test]
fn test_contract_creation_keeps_sequence() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let msg = env.signed_eth_msg(EthTxBuilder::legacy(SENDER, 1_000_000_000).create());
    handler.ante_handle(&mut ctx(), &ethereum_tx([msg]), false).unwrap();
    assert_eq!(env.accounts.sequence(SENDER), Some(0));
}

#[rstest]
#[case::unknown_signer(EthTxBuilder::legacy(SENDER, 1_000_000_000), false, "eth_sig_verification")]
#[case::other_chain(
    EthTxBuilder::legacy(SENDER, 1_000_000_000).chain_id(Some(1)),
    true,
    "eth_sig_verification"
)]
#[case::nonce_ahead(EthTxBuilder::legacy(SENDER, 1_000_000_000).nonce(5), true, "eth_increment_sequence")]
#[case::unknown_account(
    EthTxBuilder::legacy(Address::repeat_byte(0xcc), 1_000_000_000),
    true,
    "eth_vesting"
)]
fn test_rejected_ethereum_tx(
    #[case] builder: EthTxBuilder,
    #[case] register: bool,
    #[case] stage: &str,
) {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let msg = if register { env.signed_eth_msg(builder) } else { builder.build() };
    let rejection = handler.ante_handle(&mut ctx(), &ethereum_tx([msg]), false).unwrap_err();
    assert_eq!(rejection.stage, stage, "{}", rejection.error);
    assert_eq!(env.accounts.sequence(SENDER), Some(0));
}

#[test]
fn test_pre_eip155_payload_accepted() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let msg = env.signed_eth_msg(EthTxBuilder::legacy(SENDER, 1_000_000_000).chain_id(None));
    handler.ante_handle(&mut ctx(), &ethereum_tx([msg]), false).unwrap();
}

#[test]
fn test_ethereum_tx_declared_gas_must_match() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let msg = env.signed_eth_msg(EthTxBuilder::legacy(SENDER, 1_000_000_000));
    let Tx::Ethereum(mut tx) = ethereum_tx([msg]) else { unreachable!() };
    tx.fee.gas_limit += 1;
    let rejection = handler.ante_handle(&mut ctx(), &Tx::Ethereum(tx), false).unwrap_err();
    assert_eq!(rejection.stage, "eth_validate_basic");
    assert!(matches!(rejection.error, AnteError::InvalidGasLimit(_)));
}

#[test]
fn test_ethereum_tx_requires_extension_option() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let msg = env.signed_eth_msg(EthTxBuilder::legacy(SENDER, 1_000_000_000));
    let Tx::Ethereum(mut tx) = ethereum_tx([msg]) else { unreachable!() };
    tx.extension_options.clear();
    let rejection = handler.ante_handle(&mut ctx(), &Tx::Ethereum(tx), false).unwrap_err();
    assert_eq!(rejection.code(), 5);
    assert_eq!(rejection.codespace(), "evm");
}

#[test]
fn test_ethereum_fee_repeating_denom_rejected() {
    let env = env();
    let handler = AnteHandler::new(env.clone(), AnteOptions::default());
    let msg = env.signed_eth_msg(EthTxBuilder::legacy(SENDER, 1_000_000_000));
    let Tx::Ethereum(mut tx) = ethereum_tx([msg]) else { unreachable!() };
    // the first entry alone matches the payload fee
    let mut coins = tx.fee.amount.to_vec();
    coins.push(Coin::new(DENOM, U256::from(1u64)));
    tx.fee.amount = Coins::new(coins);
    let rejection = handler.ante_handle(&mut ctx(), &Tx::Ethereum(tx), false).unwrap_err();
    assert_eq!(rejection.stage, "eth_validate_basic");
    assert_eq!(
        rejection.error,
        AnteError::InvalidCoins(format!("duplicate denomination {DENOM}"))
    );
    assert_eq!(env.accounts.sequence(SENDER), Some(0));
}

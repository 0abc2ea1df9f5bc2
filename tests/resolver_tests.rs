//! End-to-end resolution tests
//!
//! Derived addresses are cross-checked against the platform SDK's own
//! `find_program_address`.

use account_resolver::idl::NumberFormat;
use account_resolver::{
    resolve, AccountSpec, ArgumentSpec, ArgumentValue, DefaultRule, Error, InstructionSpec,
    ResolutionStrategy, Resolver, ResolverConfig, SeedSpec, TypeDescriptor,
};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";

fn program() -> Pubkey {
    Pubkey::new_from_array([0x5a; 32])
}

fn caller() -> Pubkey {
    Pubkey::new_from_array([0x11; 32])
}

fn addresses(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn derived(name: &str, seeds: Vec<SeedSpec>) -> AccountSpec {
    AccountSpec::with_rule(name, DefaultRule::derived(seeds))
}

/// Reference derivation from the SDK
fn sdk_pda(seeds: &[&[u8]], program: &Pubkey) -> (Pubkey, u8) {
    let sdk_program = solana_program::pubkey::Pubkey::new_from_array(program.to_bytes());
    let (address, bump) = solana_program::pubkey::Pubkey::find_program_address(seeds, &sdk_program);
    (Pubkey::new_from_array(address.to_bytes()), bump)
}

#[test]
fn test_payer_and_vault() {
    let ix = InstructionSpec::new("deposit")
        .with_account(AccountSpec::with_rule("payer", DefaultRule::CallerAddress))
        .with_account(derived(
            "vault",
            vec![SeedSpec::utf8("vault"), SeedSpec::account("payer")],
        ));

    let result = resolve(&program(), &ix, &HashMap::new(), &HashMap::new(), caller()).unwrap();

    let caller_bytes = caller().to_bytes();
    let (expected, bump) = sdk_pda(&[b"vault", &caller_bytes], &program());
    assert!(result.is_complete());
    assert_eq!(result.address("payer"), Some(&caller()));
    assert_eq!(result.address("vault"), Some(&expected));
    assert_eq!(result.bump("vault"), Some(bump));
    assert_eq!(result.passes, 1);
}

#[test]
fn test_transitive_chain_any_order() {
    // Declared in reverse so that a single ordered sweep could not settle it
    let ix = InstructionSpec::new("chain")
        .with_account(derived("c", vec![SeedSpec::utf8("c"), SeedSpec::account("b")]))
        .with_account(derived("b", vec![SeedSpec::utf8("b"), SeedSpec::account("a")]))
        .with_account(derived("a", vec![SeedSpec::utf8("a"), SeedSpec::account("payer")]))
        .with_account(AccountSpec::with_rule("payer", DefaultRule::CallerAddress));

    let result = resolve(&program(), &ix, &HashMap::new(), &HashMap::new(), caller()).unwrap();
    assert!(result.is_complete(), "unresolved: {:?}", result.unresolved);
    assert_eq!(result.passes, 3);

    let payer = caller().to_bytes();
    let (a, _) = sdk_pda(&[b"a", &payer], &program());
    let (b, _) = sdk_pda(&[b"b", &a.to_bytes()], &program());
    let (c, _) = sdk_pda(&[b"c", &b.to_bytes()], &program());
    assert_eq!(result.address("a"), Some(&a));
    assert_eq!(result.address("b"), Some(&b));
    assert_eq!(result.address("c"), Some(&c));
}

#[test]
fn test_mutual_dependency_is_a_cycle() {
    let ix = InstructionSpec::new("cycle")
        .with_account(derived("a", vec![SeedSpec::account("b")]))
        .with_account(derived("b", vec![SeedSpec::account("a")]))
        .with_account(AccountSpec::with_rule("payer", DefaultRule::CallerAddress));

    let result = resolve(&program(), &ix, &HashMap::new(), &HashMap::new(), caller()).unwrap();
    let cycle = Error::CyclicDependency {
        names: vec!["a".to_string(), "b".to_string()],
    };
    assert_eq!(result.reason("a"), Some(&cycle));
    assert_eq!(result.reason("b"), Some(&cycle));
    assert_eq!(result.address("payer"), Some(&caller()));
}

#[test]
fn test_invalid_caller_input_is_dropped() {
    let ix = InstructionSpec::new("ix")
        .with_account(AccountSpec::new("user"))
        .with_account(derived("pda", vec![SeedSpec::account("user")]));

    let result = resolve(
        &program(),
        &ix,
        &addresses(&[("user", "not-an-address")]),
        &HashMap::new(),
        caller(),
    )
    .unwrap();

    assert!(result.address("user").is_none());
    assert_eq!(result.reason("user"), Some(&Error::missing("user")));
    assert_eq!(result.reason("pda"), Some(&Error::missing("user")));

    // Blank and whitespace-padded strings are not addresses either
    for bad in ["", " 11111111111111111111111111111111", "1111"] {
        let result = resolve(
            &program(),
            &ix,
            &addresses(&[("user", bad)]),
            &HashMap::new(),
            caller(),
        )
        .unwrap();
        assert!(result.address("user").is_none(), "accepted {:?}", bad);
    }
}

#[test]
fn test_supplied_address_feeds_derivation() {
    let user = Pubkey::new_from_array([0x33; 32]);
    let ix = InstructionSpec::new("ix")
        .with_account(AccountSpec::new("user"))
        .with_account(derived("pda", vec![SeedSpec::utf8("p"), SeedSpec::account("user")]));

    let result = resolve(
        &program(),
        &ix,
        &addresses(&[("user", user.to_string().as_str())]),
        &HashMap::new(),
        caller(),
    )
    .unwrap();

    let (expected, _) = sdk_pda(&[b"p", &user.to_bytes()], &program());
    assert_eq!(result.address("user"), Some(&user));
    assert_eq!(result.address("pda"), Some(&expected));
}

#[test]
fn test_default_rules_override_caller_input() {
    let other = Pubkey::new_from_array([0x77; 32]).to_string();
    let ix = InstructionSpec::new("ix")
        .with_account(AccountSpec::with_rule("payer", DefaultRule::CallerAddress))
        .with_account(AccountSpec::with_rule(
            "systemProgram",
            DefaultRule::constant(SYSTEM_PROGRAM.parse().unwrap()),
        ))
        .with_account(derived("vault", vec![SeedSpec::account("payer")]))
        .with_account(derived("stuck", vec![SeedSpec::account("nobody")]));

    let known = addresses(&[
        ("payer", other.as_str()),
        ("systemProgram", other.as_str()),
        ("vault", other.as_str()),
        ("stuck", other.as_str()),
    ]);
    let result = resolve(&program(), &ix, &known, &HashMap::new(), caller()).unwrap();

    let (vault, _) = sdk_pda(&[&caller().to_bytes()], &program());
    assert_eq!(result.address("payer"), Some(&caller()));
    assert_eq!(
        result.address("systemProgram").map(|k| k.to_string()),
        Some(SYSTEM_PROGRAM.to_string())
    );
    assert_eq!(result.address("vault"), Some(&vault));
    // A failing rule does not fall back to the advisory value
    assert!(result.address("stuck").is_none());
    assert_eq!(result.reason("stuck"), Some(&Error::missing("nobody")));
}

#[test]
fn test_argument_seeds() {
    let ix = InstructionSpec::new("create")
        .with_argument(ArgumentSpec::new(
            "id",
            TypeDescriptor::number(NumberFormat::U64),
        ))
        .with_argument(ArgumentSpec::new("name", TypeDescriptor::string()))
        .with_account(AccountSpec::with_rule("payer", DefaultRule::CallerAddress))
        .with_account(derived(
            "record",
            vec![
                SeedSpec::utf8("record"),
                SeedSpec::account("payer"),
                SeedSpec::argument("id"),
            ],
        ))
        .with_account(derived(
            "named",
            vec![SeedSpec::ArgumentRef {
                name: "name".to_string(),
                seed_type: Some(TypeDescriptor::raw_string()),
            }],
        ));

    let mut args = HashMap::new();
    args.insert("id".to_string(), ArgumentValue::from(42u64));
    args.insert("name".to_string(), ArgumentValue::from("alice"));
    let result = resolve(&program(), &ix, &HashMap::new(), &args, caller()).unwrap();

    let (record, _) = sdk_pda(
        &[b"record", &caller().to_bytes(), &42u64.to_le_bytes()],
        &program(),
    );
    let (named, _) = sdk_pda(&[b"alice"], &program());
    assert_eq!(result.address("record"), Some(&record));
    assert_eq!(result.address("named"), Some(&named));
}

#[test]
fn test_missing_and_invalid_arguments() {
    let ix = InstructionSpec::new("ix")
        .with_argument(ArgumentSpec::new(
            "slot",
            TypeDescriptor::number(NumberFormat::U8),
        ))
        .with_account(derived("missing", vec![SeedSpec::argument("absent")]))
        .with_account(derived("overflow", vec![SeedSpec::argument("slot")]));

    let mut args = HashMap::new();
    args.insert("slot".to_string(), ArgumentValue::from(300u64));
    let result = resolve(&program(), &ix, &HashMap::new(), &args, caller()).unwrap();

    assert_eq!(result.reason("missing"), Some(&Error::missing("absent")));
    assert!(matches!(
        result.reason("overflow"),
        Some(Error::InvalidArgument { .. })
    ));
}

#[test]
fn test_explicit_owner_program() {
    let token_program: Pubkey = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".parse().unwrap();
    let ix = InstructionSpec::new("ix")
        .with_account(AccountSpec::with_rule("payer", DefaultRule::CallerAddress))
        .with_account(AccountSpec::with_rule(
            "foreign",
            DefaultRule::derived_by(token_program, vec![SeedSpec::account("payer")]),
        ));

    let result = resolve(&program(), &ix, &HashMap::new(), &HashMap::new(), caller()).unwrap();
    let (expected, _) = sdk_pda(&[&caller().to_bytes()], &token_program);
    assert_eq!(result.address("foreign"), Some(&expected));
}

#[test]
fn test_owner_program_supplied_by_caller() {
    let token_program: Pubkey = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".parse().unwrap();
    let ix = InstructionSpec::new("ix")
        .with_account(AccountSpec::with_rule("payer", DefaultRule::CallerAddress))
        .with_account(AccountSpec::new("tokenProgram"))
        .with_account(AccountSpec::with_rule(
            "foreign",
            DefaultRule::derived_by_account("tokenProgram", vec![SeedSpec::account("payer")]),
        ));

    let result = resolve(&program(), &ix, &HashMap::new(), &HashMap::new(), caller()).unwrap();
    assert_eq!(result.reason("foreign"), Some(&Error::missing("tokenProgram")));

    let known = addresses(&[("tokenProgram", &token_program.to_string())]);
    let result = resolve(&program(), &ix, &known, &HashMap::new(), caller()).unwrap();
    let (expected, bump) = sdk_pda(&[&caller().to_bytes()], &token_program);
    assert_eq!(result.address("foreign"), Some(&expected));
    assert_eq!(result.bump("foreign"), Some(bump));
}

#[test]
fn test_argument_and_account_with_same_name() {
    // "mint" is both an argument and an account; only the account is an edge
    let ix = InstructionSpec::new("ix")
        .with_argument(ArgumentSpec::new(
            "mint",
            TypeDescriptor::number(NumberFormat::U64),
        ))
        .with_account(derived("ledger", vec![SeedSpec::argument("mint")]))
        .with_account(derived("mint", vec![SeedSpec::account("ledger")]));

    let result = resolve(&program(), &ix, &HashMap::new(), &HashMap::new(), caller()).unwrap();
    assert_eq!(result.reason("ledger"), Some(&Error::missing("mint")));
    assert_eq!(result.reason("mint"), Some(&Error::missing("ledger")));

    let mut args = HashMap::new();
    args.insert("mint".to_string(), ArgumentValue::from(5u64));
    let result = resolve(&program(), &ix, &HashMap::new(), &args, caller()).unwrap();
    let (ledger, _) = sdk_pda(&[&5u64.to_le_bytes()], &program());
    let (mint, _) = sdk_pda(&[&ledger.to_bytes()], &program());
    assert_eq!(result.address("ledger"), Some(&ledger));
    assert_eq!(result.address("mint"), Some(&mint));
}

#[test]
fn test_legacy_two_pass_leaves_nested_pdas() {
    let ix = InstructionSpec::new("chain")
        .with_account(AccountSpec::with_rule("payer", DefaultRule::CallerAddress))
        .with_account(derived("a", vec![SeedSpec::account("payer")]))
        .with_account(derived("b", vec![SeedSpec::account("a")]));

    let resolver =
        Resolver::new(ResolverConfig::default().with_strategy(ResolutionStrategy::LegacyTwoPass));
    let result = resolver
        .resolve(&program(), &ix, &HashMap::new(), &HashMap::new(), caller())
        .unwrap();

    assert!(result.address("a").is_some());
    assert!(result.address("b").is_none());
    assert_eq!(result.passes, 1);
    assert_eq!(result.reason("b"), Some(&Error::PassLimitReached { passes: 1 }));
}

#[test]
fn test_duplicate_account_names_rejected() {
    let ix = InstructionSpec::new("dup")
        .with_account(AccountSpec::new("x"))
        .with_account(AccountSpec::new("x"));
    assert_eq!(
        resolve(&program(), &ix, &HashMap::new(), &HashMap::new(), caller()),
        Err(Error::DuplicateAccount {
            instruction: "dup".to_string(),
            name: "x".to_string(),
        })
    );
}

#[test]
fn test_repeated_calls_are_identical() {
    let ix = InstructionSpec::new("ix")
        .with_account(AccountSpec::with_rule("payer", DefaultRule::CallerAddress))
        .with_account(derived("a", vec![SeedSpec::account("b")]))
        .with_account(derived("b", vec![SeedSpec::account("payer")]))
        .with_account(derived("c", vec![SeedSpec::account("d")]))
        .with_account(derived("d", vec![SeedSpec::account("c")]))
        .with_account(AccountSpec::new("free"));

    let first = resolve(&program(), &ix, &HashMap::new(), &HashMap::new(), caller()).unwrap();
    for _ in 0..5 {
        let again = resolve(&program(), &ix, &HashMap::new(), &HashMap::new(), caller()).unwrap();
        assert_eq!(first, again);
    }
    assert_eq!(first.unresolved_names(), vec!["c", "d", "free"]);
}

#[test]
fn test_result_string_map() {
    let ix = InstructionSpec::new("ix")
        .with_account(AccountSpec::with_rule("payer", DefaultRule::CallerAddress));
    let result = resolve(&program(), &ix, &HashMap::new(), &HashMap::new(), caller()).unwrap();
    let map = result.to_string_map();
    assert_eq!(map.get("payer"), Some(&caller().to_string()));
}

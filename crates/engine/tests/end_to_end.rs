//! Full flows over the SQLite store

use chrono::{Duration, TimeZone, Utc};
use loyalty_core::{Backend, Currency, CurrencyLedger, Error, LedgerQuery, LedgerReason, PlayerId};
use loyalty_engine::{EngineConfig, GameConfig, LoyaltyService, ManualClock};
use loyalty_persistence::{create_player, Database};
use std::sync::Arc;

async fn setup(players: &[&str]) -> (Database, Arc<ManualClock>, LoyaltyService) {
    let db = Database::connect_in_memory().await.unwrap();
    for player in players {
        create_player(db.pool(), &PlayerId::parse(player).unwrap())
            .await
            .unwrap();
    }
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
    ));
    let backend: Arc<dyn Backend> = Arc::new(db.clone());
    let service = LoyaltyService::new(
        backend,
        clock.clone(),
        EngineConfig::default(),
        GameConfig::default(),
    );
    (db, clock, service)
}

#[tokio::test]
async fn test_referral_flow_below_first_tier() {
    let (db, _, service) = setup(&["first", "second"]).await;
    let first = PlayerId::parse("first").unwrap();

    let code = service
        .post_registration_setup("first", None)
        .await
        .unwrap()
        .personal_referral_code;
    let outcome = service
        .post_registration_setup("second", Some(code.as_str()))
        .await
        .unwrap();
    assert_eq!(outcome.referred_by, Some(first.clone()));

    let profile = service.referrals().profile("first").await.unwrap();
    assert_eq!(profile.total_referrals, 1);
    let profile = service.referrals().profile("second").await.unwrap();
    assert_eq!(profile.referred_by, Some(first.clone()));

    // One referral pays no commission
    assert!(service
        .distribute_referral_commission("second", 100)
        .await
        .is_none());
    assert_eq!(db.balance(&first, Currency::Tickets).await.unwrap(), 0);

    let stats = service.get_referral_stats("first").await.unwrap();
    assert_eq!(stats.referral_code, code.to_string());
    assert_eq!(stats.referred_users.len(), 1);
    assert_eq!(stats.earnings.all_time, 0);
}

#[tokio::test]
async fn test_commission_flows_into_stats() {
    let names = ["root", "a", "b", "c", "d", "e"];
    let (db, _, service) = setup(&names).await;

    let code = service
        .post_registration_setup("root", None)
        .await
        .unwrap()
        .personal_referral_code;
    for name in &names[1..] {
        service
            .post_registration_setup(name, Some(code.as_str()))
            .await
            .unwrap();
    }

    // Five referrals: 2%
    let grant = service
        .distribute_referral_commission("a", 250)
        .await
        .unwrap();
    assert_eq!(grant.commission, 5);

    let root = PlayerId::parse("root").unwrap();
    assert_eq!(db.balance(&root, Currency::Tickets).await.unwrap(), 5);

    let stats = service.get_referral_stats("root").await.unwrap();
    assert_eq!(stats.total_referrals, 5);
    assert_eq!(stats.earnings.today, 5);
    assert_eq!(stats.referred_users.len(), 5);
    let a = stats
        .referred_users
        .iter()
        .find(|u| u.player_id.as_str() == "a")
        .unwrap();
    assert_eq!(a.commission_earned, 5);
}

#[tokio::test]
async fn test_daily_streak_over_sqlite() {
    let (db, clock, service) = setup(&["p1"]).await;
    let player = PlayerId::parse("p1").unwrap();

    let receipt = service.claim_daily_reward("p1").await.unwrap();
    assert_eq!((receipt.reward_amount, receipt.balance), (10, 10));
    assert!(matches!(
        service.claim_daily_reward("p1").await,
        Err(Error::AlreadyClaimedToday)
    ));

    // No activity since yesterday's claim
    clock.advance(Duration::days(1));
    assert!(!service.get_daily_reward_state("p1").await.unwrap().can_claim);
    assert!(matches!(
        service.claim_daily_reward("p1").await,
        Err(Error::ActivityRequired)
    ));

    // Spending a ticket on the wheel counts as activity
    service.wheel().spin("p1").await.unwrap();
    let state = service.get_daily_reward_state("p1").await.unwrap();
    assert!(state.can_claim);
    assert_eq!(state.next_reward, 20);
    assert_eq!(service.claim_daily_reward("p1").await.unwrap().streak, 2);

    let rewards = db
        .ledger_entries(&player, &LedgerQuery::reason(LedgerReason::DailyReward))
        .await
        .unwrap();
    assert_eq!(rewards.len(), 2);

    let history = service.history().transactions("p1", None).await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].reason, LedgerReason::DailyReward);
}

use super::helpers::{
    personalized_expected, personalized_send, run_collective, run_collective_with_config,
    run_recorded,
};
use hypercast::{HypercastConfig, HypercastError, Operation, PersonalizedStrategy};
use std::time::Duration;

async fn check_strategy(world: u32, size: usize, strategy: PersonalizedStrategy) {
    run_collective(world, move |client| async move {
        let rank = client.rank();
        for run in 0..3 {
            let send = personalized_send(rank, world, size, run);
            let result = client
                .all_to_all_personalized_with(&send, size, strategy)
                .await
                .unwrap();
            assert_eq!(
                result,
                personalized_expected(rank, world, size, run),
                "{strategy} world {world} size {size} rank {rank} run {run}"
            );
        }
    })
    .await;
}

#[tokio::test]
async fn test_personalized_mesh_power_of_two_worlds() {
    for world in [1, 2, 4, 8] {
        for size in [1, 4] {
            check_strategy(world, size, PersonalizedStrategy::Mesh).await;
        }
    }
}

#[tokio::test]
async fn test_personalized_direct_power_of_two_worlds() {
    for world in [1, 2, 4, 8] {
        for size in [1, 4] {
            check_strategy(world, size, PersonalizedStrategy::Direct).await;
        }
    }
}

#[tokio::test]
async fn test_personalized_strategies_agree() {
    run_collective(8, |client| async move {
        let send: Vec<u32> = (0..8).map(|p| client.rank() * 100 + p).collect();
        let direct = client
            .all_to_all_personalized_with(&send, 1, PersonalizedStrategy::Direct)
            .await
            .unwrap();
        let mesh = client
            .all_to_all_personalized_with(&send, 1, PersonalizedStrategy::Mesh)
            .await
            .unwrap();
        assert_eq!(direct, mesh);
        let expected: Vec<u32> = (0..8).map(|p| p * 100 + client.rank()).collect();
        assert_eq!(mesh, expected);
    })
    .await;
}

#[tokio::test]
async fn test_personalized_uses_configured_strategy() {
    let cfg = HypercastConfig {
        personalized_strategy: PersonalizedStrategy::Direct,
        ..HypercastConfig::default()
    };
    run_collective_with_config(4, cfg, |client| async move {
        assert_eq!(
            client.config().personalized_strategy,
            PersonalizedStrategy::Direct
        );
        let send = personalized_send(client.rank(), 4, 2, 1);
        let result = client.all_to_all_personalized(&send, 2).await.unwrap();
        assert_eq!(result, personalized_expected(client.rank(), 4, 2, 1));
    })
    .await;
}

#[tokio::test]
async fn test_personalized_round_counts() {
    let mesh = run_recorded(8, |client| async move {
        let send = personalized_send(client.rank(), 8, 1, 0);
        client
            .all_to_all_personalized_with(&send, 1, PersonalizedStrategy::Mesh)
            .await
            .unwrap();
    })
    .await;
    for recorder in &mesh {
        let call = recorder.last_call().unwrap();
        assert_eq!(call.operation, Operation::AllToAllPersonalized);
        assert_eq!(call.planned_rounds, 3);
        assert_eq!(call.completed_rounds, Some(3));
        assert_eq!(call.events.len(), 3);
    }

    let direct = run_recorded(8, |client| async move {
        let send = personalized_send(client.rank(), 8, 1, 0);
        client
            .all_to_all_personalized_with(&send, 1, PersonalizedStrategy::Direct)
            .await
            .unwrap();
    })
    .await;
    for recorder in &direct {
        let call = recorder.last_call().unwrap();
        assert_eq!(call.planned_rounds, 7);
        assert_eq!(call.events.len(), 7);
        // Every other rank is a partner exactly once.
        let mut partners: Vec<u32> = call.events.iter().map(|e| e.partner).collect();
        partners.sort();
        partners.dedup();
        assert_eq!(partners.len(), 7);
    }
}

#[tokio::test]
async fn test_personalized_single_rank_is_identity() {
    let recorders = run_recorded(1, |client| async move {
        let result = client.all_to_all_personalized(&[3i8, 4], 2).await.unwrap();
        assert_eq!(result, vec![3, 4]);
    })
    .await;
    assert!(recorders[0].last_call().unwrap().events.is_empty());
}

#[tokio::test]
async fn test_personalized_rejects_non_power_of_two() {
    for world in [3, 5, 6, 7] {
        run_collective(world, move |client| async move {
            let send = vec![0u64; world as usize];
            for strategy in [PersonalizedStrategy::Direct, PersonalizedStrategy::Mesh] {
                // Rejected locally, so a single rank never blocks.
                let result = tokio::time::timeout(
                    Duration::from_secs(1),
                    client.all_to_all_personalized_with(&send, 1, strategy),
                )
                .await
                .expect("rejection must not wait for peers");
                let err = result.unwrap_err();
                match err {
                    HypercastError::NonPowerOfTwoWorld { world_size, .. } => {
                        assert_eq!(world_size, world)
                    }
                    ref other => panic!("unexpected error: {other}"),
                }
                assert!(err.is_configuration());
            }
        })
        .await;
    }
}

#[tokio::test]
async fn test_personalized_input_length_checked_locally() {
    let clients = hypercast::HypercubeClient::bootstrap_local(4);
    let err = clients[2]
        .all_to_all_personalized(&[1u32, 2, 3], 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HypercastError::InputLengthMismatch {
            expected: 4,
            actual: 3,
            ..
        }
    ));
    let err = clients[2]
        .all_to_all_personalized::<u32>(&[], 0)
        .await
        .unwrap_err();
    assert!(matches!(err, HypercastError::ZeroSize { .. }));
}

#[tokio::test]
async fn test_personalized_oversized_size_is_rejected() {
    let clients = hypercast::HypercubeClient::bootstrap_local(4);
    for size in [usize::MAX / 2 + 1, 1usize << 62, usize::MAX] {
        let err = clients[0]
            .all_to_all_personalized(&[1u8], size)
            .await
            .unwrap_err();
        assert!(err.is_configuration(), "size {size}: {err}");
        assert!(matches!(
            err,
            HypercastError::PayloadTooLarge { .. } | HypercastError::InputLengthMismatch { .. }
        ));
    }
    // 4 * 2^62 wraps to 0, which an empty input would otherwise match.
    let err = clients[0]
        .all_to_all_personalized::<u8>(&[], 1usize << 62)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HypercastError::PayloadTooLarge {
            bytes: usize::MAX,
            ..
        }
    ));
}

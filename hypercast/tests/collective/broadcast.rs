use super::helpers::{run_collective, run_recorded};
use hypercast::{Operation, Route};

fn contribution(rank: u32, size: usize) -> Vec<u64> {
    (0..size).map(|k| rank as u64 * 1000 + k as u64).collect()
}

fn gathered(world: u32, size: usize) -> Vec<u64> {
    (0..world).flat_map(|r| contribution(r, size)).collect()
}

#[tokio::test]
async fn test_broadcast_4_nodes_rank_values() {
    run_collective(4, |client| async move {
        let result = client
            .all_to_all_broadcast(&[client.rank() as i32], 1)
            .await
            .unwrap();
        assert_eq!(result, vec![0, 1, 2, 3]);
    })
    .await;
}

#[tokio::test]
async fn test_broadcast_3_nodes_drops_virtual_slot() {
    run_collective(3, |client| async move {
        let result = client
            .all_to_all_broadcast(&[client.rank() as i32], 1)
            .await
            .unwrap();
        assert_eq!(result, vec![0, 1, 2]);
    })
    .await;
}

#[tokio::test]
async fn test_broadcast_all_world_sizes() {
    for world in 1..=9u32 {
        for size in [1usize, 3, 16] {
            run_collective(world, move |client| async move {
                let mine = contribution(client.rank(), size);
                let result = client.all_to_all_broadcast(&mine, size).await.unwrap();
                assert_eq!(
                    result,
                    gathered(world, size),
                    "world {world}, size {size}, rank {}",
                    client.rank()
                );
            })
            .await;
        }
    }
}

#[tokio::test]
async fn test_broadcast_single_rank_returns_input() {
    let recorders = run_recorded(1, |client| async move {
        let result = client.all_to_all_broadcast(&[7u16, 8, 9], 3).await.unwrap();
        assert_eq!(result, vec![7, 8, 9]);
    })
    .await;
    let call = recorders[0].last_call().unwrap();
    assert_eq!(call.planned_rounds, 0);
    assert!(call.events.is_empty());
}

#[tokio::test]
async fn test_broadcast_is_idempotent() {
    run_collective(6, |client| async move {
        let mine = contribution(client.rank(), 2);
        let first = client.all_to_all_broadcast(&mine, 2).await.unwrap();
        let second = client.all_to_all_broadcast(&mine, 2).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(mine, contribution(client.rank(), 2));
    })
    .await;
}

#[tokio::test]
async fn test_broadcast_float_elements() {
    run_collective(5, |client| async move {
        let mine = [client.rank() as f64 + 0.5];
        let result = client.all_to_all_broadcast(&mine, 1).await.unwrap();
        assert_eq!(result, vec![0.5, 1.5, 2.5, 3.5, 4.5]);
    })
    .await;
}

#[tokio::test]
async fn test_broadcast_back_to_back_different_sizes() {
    run_collective(7, |client| async move {
        let small = client
            .all_to_all_broadcast(&contribution(client.rank(), 1), 1)
            .await
            .unwrap();
        let large = client
            .all_to_all_broadcast(&contribution(client.rank(), 5), 5)
            .await
            .unwrap();
        assert_eq!(small, gathered(7, 1));
        assert_eq!(large, gathered(7, 5));
    })
    .await;
}

#[tokio::test]
async fn test_broadcast_round_counts_with_virtual_ranks() {
    // N = 5: d = 3, ranks 1..=3 host virtual ranks 5..=7.
    let recorders = run_recorded(5, |client| async move {
        client
            .all_to_all_broadcast(&[client.rank() as u8], 1)
            .await
            .unwrap();
    })
    .await;

    for (rank, recorder) in recorders.iter().enumerate() {
        let call = recorder.last_call().unwrap();
        assert_eq!(call.operation, Operation::AllToAllBroadcast);
        assert_eq!(call.planned_rounds, 3);
        assert_eq!(call.completed_rounds, Some(3));

        let physical = call
            .events
            .iter()
            .filter(|e| !e.participant.is_virtual())
            .count();
        let virtual_ = call.events.len() - physical;
        assert_eq!(physical, 3, "rank {rank}");
        let hosts = (1..=3).contains(&rank);
        assert_eq!(virtual_, if hosts { 3 } else { 0 }, "rank {rank}");

        // Buffers double every round.
        for e in &call.events {
            assert_eq!(e.elements, 2usize << e.round);
        }
    }
}

#[tokio::test]
async fn test_broadcast_last_round_swaps_locally_on_host() {
    // N = 3: d = 2, rank 1 hosts virtual rank 3, its round-1 partner.
    let recorders = run_recorded(3, |client| async move {
        client
            .all_to_all_broadcast(&[client.rank() as u32], 1)
            .await
            .unwrap();
    })
    .await;

    let host = recorders[1].last_call().unwrap();
    let last_round: Vec<_> = host.events.iter().filter(|e| e.round == 1).collect();
    assert_eq!(last_round.len(), 2);
    assert!(last_round.iter().all(|e| e.route == Route::Local));

    let rank0 = recorders[0].last_call().unwrap();
    assert!(rank0
        .events
        .iter()
        .all(|e| matches!(e.route, Route::Remote { .. })));
}

//! Property-based tests for conversation reads
//!
//! Generates random message histories between a small set of users and
//! checks the repository's read operations against them.

use proptest::prelude::*;
use share_everything::Message;

use crate::common::*;

const USERS: [&str; 3] = ["alice", "bob", "carol"];

fn history() -> impl Strategy<Value = Vec<(usize, usize, i64)>> {
    prop::collection::vec((0usize..3, 0usize..3, 0i64..1_000), 0..25)
        .prop_map(|entries| entries.into_iter().filter(|(s, r, _)| s != r).collect())
}

fn load(entries: &[(usize, usize, i64)]) -> Vec<Message> {
    let (_backend, repo) = memory_repository();
    tokio_test::block_on(async {
        for (sender, receiver, ts) in entries {
            repo.send(&message_at(USERS[*sender], USERS[*receiver], "m", *ts))
                .await
                .expect("insert into memory backend");
        }
        repo.fetch_all_conversations("alice").await.expect("select")
    })
}

proptest! {
    #[test]
    fn test_conversation_is_symmetric(entries in history()) {
        let (_backend, repo) = memory_repository();
        let (forward, backward) = tokio_test::block_on(async {
            for (sender, receiver, ts) in &entries {
                repo.send(&message_at(USERS[*sender], USERS[*receiver], "m", *ts)).await.expect("insert");
            }
            (
                repo.fetch_conversation("alice", "bob").await.expect("select"),
                repo.fetch_conversation("bob", "alice").await.expect("select"),
            )
        });

        prop_assert_eq!(&forward, &backward);
        prop_assert!(forward.iter().all(|m| m.involves("alice", "bob")));

        let expected = entries
            .iter()
            .filter(|(s, r, _)| (*s == 0 && *r == 1) || (*s == 1 && *r == 0))
            .count();
        prop_assert_eq!(forward.len(), expected);
        prop_assert!(forward.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_all_conversations_cover_every_partner(entries in history()) {
        let messages = load(&entries);

        prop_assert!(messages.iter().all(|m| m.sender == "alice" || m.receiver == "alice"));
        prop_assert!(messages.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));

        let expected = entries.iter().filter(|(s, r, _)| *s == 0 || *r == 0).count();
        prop_assert_eq!(messages.len(), expected);
    }
}

//! Drives `KubectlCluster` against stand-in binaries so real child
//! processes are spawned without a cluster.

#![cfg(unix)]

use arena_cluster::{ClusterControl, ClusterError, KubectlCluster};
use arena_core::config::ClusterConfig;

fn cluster_with(program: &str) -> KubectlCluster {
    let mut config = ClusterConfig::default();
    config.kubectl_path = program.to_string();
    config.namespace = "load".to_string();
    KubectlCluster::new(&config)
}

#[tokio::test]
async fn members_are_split_on_whitespace() {
    // `echo` prints its arguments, so the "members" are the argument words.
    let cluster = cluster_with("echo");
    let members = cluster.list_members("battle-1").await.unwrap();

    assert_eq!(members[0], "get");
    assert_eq!(members[1], "pods");
    assert!(members.contains(&"app.kubernetes.io/instance=battle-1".to_string()));
}

#[tokio::test]
async fn unparseable_size_output_is_zero() {
    let cluster = cluster_with("echo");
    assert_eq!(cluster.pool_size("battle-1").await.unwrap(), 0);
}

#[tokio::test]
async fn scale_succeeds_when_command_succeeds() {
    let cluster = cluster_with("true");
    cluster.set_pool_size("battle-1", 2).await.unwrap();
}

#[tokio::test]
async fn non_zero_exit_is_command_failed() {
    let cluster = cluster_with("false");
    let err = cluster.set_pool_size("battle-1", 2).await.unwrap_err();
    match err {
        ClusterError::CommandFailed { command, .. } => {
            assert!(command.contains("--replicas=2"));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_binary_is_spawn_error() {
    let cluster = cluster_with("/nonexistent/kubectl");
    let err = cluster.pool_size("battle-1").await.unwrap_err();
    assert!(matches!(err, ClusterError::Spawn { .. }));
}

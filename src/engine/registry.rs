//! Task registry and plan resolution
//!
//! Stores named tasks and resolves a requested task into an execution
//! plan: the transitive dependency closure, ordered so every dependency
//! precedes its dependent, each task once. Cycles and unknown names are
//! rejected before anything executes. Uses petgraph for the graph
//! machinery.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsPostOrder;
use thiserror::Error;

use super::task::Task;

#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Cyclic dependency between tasks: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),
}

/// Registry of named tasks
#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task; a task with the same name is overwritten
    pub fn register(&mut self, task: Task) {
        self.tasks.insert(task.name().to_string(), task);
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Resolves a requested task into an execution plan.
    ///
    /// Depth-first over the dependency edges reachable from `name`;
    /// post-order puts dependencies before dependents. Unknown names and
    /// cycles are detected here, before any body runs.
    pub fn resolve(&self, name: &str) -> Result<Vec<String>, TaskError> {
        if !self.tasks.contains_key(name) {
            return Err(TaskError::UnknownTask(name.to_string()));
        }

        // Collect the reachable task set, validating dependency names.
        let mut reachable = Vec::new();
        let mut seen = HashMap::new();
        let mut stack = vec![name];
        while let Some(current) = stack.pop() {
            if seen.contains_key(current) {
                continue;
            }
            seen.insert(current, ());
            reachable.push(current);

            let task = self
                .tasks
                .get(current)
                .ok_or_else(|| TaskError::UnknownTask(current.to_string()))?;
            for dep in task.dependencies() {
                if !self.tasks.contains_key(dep.as_str()) {
                    return Err(TaskError::UnknownTask(dep.clone()));
                }
                stack.push(dep.as_str());
            }
        }

        // Build the reachable subgraph: task -> dependency edges.
        let mut graph = DiGraph::<&str, ()>::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
        for task_name in &reachable {
            nodes.insert(*task_name, graph.add_node(*task_name));
        }
        for task_name in &reachable {
            let from = nodes[*task_name];
            for dep in self.tasks[*task_name].dependencies() {
                graph.add_edge(from, nodes[dep.as_str()], ());
            }
        }

        // Any strongly connected component with more than one node, or a
        // self-edge, is a cycle.
        for scc in tarjan_scc(&graph) {
            let is_cycle = scc.len() > 1 || graph.contains_edge(scc[0], scc[0]);
            if is_cycle {
                let mut names: Vec<String> =
                    scc.iter().map(|idx| graph[*idx].to_string()).collect();
                names.sort();
                return Err(TaskError::CyclicDependency(names));
            }
        }

        let mut plan = Vec::with_capacity(reachable.len());
        let mut dfs = DfsPostOrder::new(&graph, nodes[name]);
        while let Some(idx) = dfs.next(&graph) {
            plan.push(graph[idx].to_string());
        }

        Ok(plan)
    }
}

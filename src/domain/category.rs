// ==========================================
// 鱼塘养殖管理系统 - 分类树
// ==========================================
// 职责: 品种/饲料类型的层级关系
// 结构: parent_id 邻接表 + 索引表（arena），祖先/后代按需遍历
// ==========================================

use crate::domain::error::{DomainError, DomainResult};
use std::collections::HashMap;

/// 可挂入分类树的节点
pub trait CategoryNode {
    fn node_id(&self) -> i64;
    fn parent_id(&self) -> Option<i64>;
    fn label(&self) -> &str;
}

/// 分类树
///
/// nodes 为 arena，index 将业务 ID 映射到 arena 下标。
/// 构建时校验父节点存在且无环。
#[derive(Debug, Clone)]
pub struct CategoryTree<T: CategoryNode> {
    nodes: Vec<T>,
    index: HashMap<i64, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl<T: CategoryNode> CategoryTree<T> {
    /// 从节点列表构建分类树
    ///
    /// # 返回
    /// - Err(DomainError::InvalidHierarchy): ID 重复、父节点缺失或存在环
    pub fn build(nodes: Vec<T>) -> DomainResult<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (pos, node) in nodes.iter().enumerate() {
            if index.insert(node.node_id(), pos).is_some() {
                return Err(DomainError::InvalidHierarchy(format!(
                    "节点ID重复: {}",
                    node.node_id()
                )));
            }
        }

        let mut children = vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();
        for (pos, node) in nodes.iter().enumerate() {
            match node.parent_id() {
                None => roots.push(pos),
                Some(parent) => {
                    let parent_pos = *index.get(&parent).ok_or_else(|| {
                        DomainError::InvalidHierarchy(format!(
                            "节点{}的父节点{}不存在",
                            node.node_id(),
                            parent
                        ))
                    })?;
                    children[parent_pos].push(pos);
                }
            }
        }

        let tree = Self {
            nodes,
            index,
            children,
            roots,
        };

        // 所有节点必须能从某个根到达，否则存在环
        let reachable = tree.roots.iter().map(|&r| tree.subtree_size(r)).sum::<usize>();
        if reachable != tree.nodes.len() {
            return Err(DomainError::InvalidHierarchy("分类树存在环".to_string()));
        }

        Ok(tree)
    }

    fn subtree_size(&self, pos: usize) -> usize {
        1 + self.children[pos]
            .iter()
            .map(|&c| self.subtree_size(c))
            .sum::<usize>()
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.index.get(&id).map(|&pos| &self.nodes[pos])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> Vec<&T> {
        self.roots.iter().map(|&pos| &self.nodes[pos]).collect()
    }

    /// 祖先节点（由近及远，不含自身）
    pub fn ancestors(&self, id: i64) -> Vec<&T> {
        let mut result = Vec::new();
        let mut current = self.get(id).and_then(|n| n.parent_id());
        while let Some(parent_id) = current {
            match self.get(parent_id) {
                Some(parent) => {
                    result.push(parent);
                    current = parent.parent_id();
                }
                None => break,
            }
        }
        result
    }

    /// 后代节点（深度优先，不含自身）
    pub fn descendants(&self, id: i64) -> Vec<&T> {
        let mut result = Vec::new();
        let Some(&start) = self.index.get(&id) else {
            return result;
        };

        let mut stack: Vec<usize> = self.children[start].iter().rev().copied().collect();
        while let Some(pos) = stack.pop() {
            result.push(&self.nodes[pos]);
            stack.extend(self.children[pos].iter().rev().copied());
        }
        result
    }

    /// 自身及所有后代的 ID（用于“某品种及其子品种”的查询范围）
    pub fn subtree_ids(&self, id: i64) -> Vec<i64> {
        if self.get(id).is_none() {
            return Vec::new();
        }
        std::iter::once(id)
            .chain(self.descendants(id).into_iter().map(|n| n.node_id()))
            .collect()
    }

    /// 从根到该节点的路径标签，如 "鲤科 / 鲢鱼"
    pub fn path(&self, id: i64) -> Option<String> {
        let node = self.get(id)?;
        let mut labels: Vec<&str> = self.ancestors(id).iter().map(|n| n.label()).collect();
        labels.reverse();
        labels.push(node.label());
        Some(labels.join(" / "))
    }

    pub fn is_descendant_of(&self, id: i64, ancestor_id: i64) -> bool {
        self.ancestors(id).iter().any(|n| n.node_id() == ancestor_id)
    }
}

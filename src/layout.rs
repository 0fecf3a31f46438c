//! Per-view layout state for renderers
//!
//! A [`LayoutSession`] places converted graph nodes in one column per level
//! and owns everything a view mutates: canvas size, pan offset and the color
//! counter. Several sessions can lay out independent graphs side by side.

use std::collections::HashMap;

use crate::converter::{Color, Graph, Vec2};
use crate::models::ItemId;

const PALETTE: [Color; 8] = [
    Color::rgb(0x4e, 0x79, 0xa7),
    Color::rgb(0xf2, 0x8e, 0x2b),
    Color::rgb(0xe1, 0x57, 0x59),
    Color::rgb(0x76, 0xb7, 0xb2),
    Color::rgb(0x59, 0xa1, 0x4f),
    Color::rgb(0xed, 0xc9, 0x48),
    Color::rgb(0xb0, 0x7a, 0xa1),
    Color::rgb(0x9c, 0x75, 0x5f),
];

#[derive(Debug, Clone)]
pub struct LayoutSession {
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub node_height: f64,
    pub padding: f64,
    pan: Vec2,
    next_color: usize,
    colors: HashMap<ItemId, Color>,
}

impl Default for LayoutSession {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

impl LayoutSession {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            font_size: 20.0,
            node_height: 60.0,
            padding: 20.0,
            pan: Vec2::default(),
            next_color: 0,
            colors: HashMap::new(),
        }
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan.x += dx;
        self.pan.y += dy;
    }

    /// Approximate label width; there is no font backend here.
    pub fn text_width(&self, label: &str) -> f64 {
        label.chars().count() as f64 * self.font_size * 0.6
    }

    /// Place every node: one column per level, rows spread evenly.
    /// Positions are node centres.
    pub fn arrange(&self, graph: &mut Graph) {
        let levels = graph.levels();
        let columns = levels.len() as f64 + 1.0;

        for (level, members) in levels.iter().enumerate() {
            let rows = members.len() as f64 + 1.0;
            for (row, &index) in members.iter().enumerate() {
                let text = self.text_width(graph.nodes[index].item.as_str());
                let node = &mut graph.nodes[index];
                node.position.x = self.width / columns * (level as f64 + 1.0) + self.pan.x;
                node.position.y = self.height / rows * (row as f64 + 1.0) + self.pan.y;
                node.size.text = text;
                node.size.width = text + self.padding;
                node.size.height = self.node_height;
            }
        }
    }

    /// Give each distinct item a palette color, stable for this session.
    pub fn assign_colors(&mut self, graph: &mut Graph) {
        for node in &mut graph.nodes {
            let color = match self.colors.get(&node.item) {
                Some(color) => *color,
                None => {
                    let color = PALETTE[self.next_color % PALETTE.len()];
                    self.next_color += 1;
                    self.colors.insert(node.item.clone(), color);
                    color
                }
            };
            node.color = Some(color);
        }
    }

    /// Topmost node whose box contains the point
    pub fn node_at(&self, graph: &Graph, x: f64, y: f64) -> Option<usize> {
        graph.nodes.iter().position(|node| {
            let half_w = node.size.width / 2.0;
            let half_h = node.size.height / 2.0;
            x > node.position.x - half_w
                && x < node.position.x + half_w
                && y > node.position.y - half_h
                && y < node.position.y + half_h
        })
    }

    /// Move one node; topology is untouched.
    pub fn drag(&self, graph: &mut Graph, index: usize, dx: f64, dy: f64) {
        if let Some(node) = graph.nodes.get_mut(index) {
            node.position.x += dx;
            node.position.y += dy;
        }
    }
}

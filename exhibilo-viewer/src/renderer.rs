/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use exhibilo_core::{Camera, DecodedAsset, Material, Triangle};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

const GRID_CHAR: char = '·';
const GRID_DIVISIONS: usize = 10;
const GRID_SAMPLES: usize = 96;
/// Keeps the grid behind geometry lying exactly on the floor
const GRID_DEPTH_BIAS: f32 = 1e-4;

/// Floor-to-edge ambient term so faces at grazing angles stay visible
const AMBIENT: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Background {
    #[default]
    Dark,
    Light,
}

impl Background {
    pub fn toggle(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    fn color(self) -> Color {
        match self {
            Self::Dark => Color::Black,
            Self::Light => Color::White,
        }
    }

    fn grid_color(self) -> Color {
        match self {
            Self::Dark => Color::DarkGrey,
            Self::Light => Color::Grey,
        }
    }
}

/// ASCII renderer that converts decoded scenes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Color>,
    background: Background,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![Color::Reset; size],
            background: Background::default(),
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        let background = self.background;
        *self = Self::new(width, height);
        self.background = background;
    }

    pub fn background(&self) -> Background {
        self.background
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Color::Reset);
    }

    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    /// Number of cells holding something other than blank space
    pub fn covered_cells(&self) -> usize {
        self.char_buffer.iter().filter(|c| **c != ' ').count()
    }

    /// Render every mesh of `asset`, with `orbit` applied on top of the
    /// scene's own transforms.
    pub fn render_asset(&mut self, asset: &DecodedAsset, orbit: &Matrix4<f32>, camera: &Camera) {
        let view_projection = camera.projection_matrix() * camera.view_matrix();
        let light = (camera.position - camera.target)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);

        asset.for_each_mesh(|world, model_mesh| {
            let model = orbit * world;
            let mvp = view_projection * model;
            let normal_matrix: Matrix3<f32> = model.fixed_view::<3, 3>(0, 0).into_owned();

            for triangle in &model_mesh.mesh.triangles {
                self.render_triangle(
                    triangle,
                    &mvp,
                    &normal_matrix,
                    &light,
                    &model_mesh.material,
                    camera,
                );
            }
        });
    }

    /// Square grid on the plane `y = height`, sized to the asset extent
    pub fn render_floor(&mut self, height: f32, extent: f32, orbit: &Matrix4<f32>, camera: &Camera) {
        let mvp = camera.projection_matrix() * camera.view_matrix() * orbit;
        let half = extent.max(f32::EPSILON) * 2.0;
        let spacing = 2.0 * half / GRID_DIVISIONS as f32;
        let color = self.background.grid_color();

        for i in 0..=GRID_DIVISIONS {
            let offset = -half + i as f32 * spacing;
            self.draw_grid_line(
                &mvp,
                camera,
                Point3::new(-half, height, offset),
                Point3::new(half, height, offset),
                color,
            );
            self.draw_grid_line(
                &mvp,
                camera,
                Point3::new(offset, height, -half),
                Point3::new(offset, height, half),
                color,
            );
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        mvp: &Matrix4<f32>,
        normal_matrix: &Matrix3<f32>,
        light: &Vector3<f32>,
        material: &Material,
        camera: &Camera,
    ) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match camera.project_with(mvp, &vertex.position, self.width as u32, self.height as u32) {
                Some(projected) => *slot = projected,
                None => return, // Triangle is clipped
            }
        }

        // Both sides are lit: STL winding is not reliable
        let normal = (normal_matrix * triangle.calculate_normal())
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros);
        let brightness = AMBIENT + (1.0 - AMBIENT) * normal.dot(light).abs();

        let color = shade(material, brightness);
        if material.wireframe {
            let character = ramp(brightness.max(0.6));
            for (a, b) in [(0, 1), (1, 2), (2, 0)] {
                self.draw_edge(screen_coords[a], screen_coords[b], character, color);
            }
        } else {
            self.rasterize_triangle(&screen_coords, ramp(brightness), color);
        }
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char, color: Color) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                if let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                        self.plot(px, py, depth, character, color);
                    }
                }
            }
        }
    }

    fn draw_edge(&mut self, from: (f32, f32, f32), to: (f32, f32, f32), character: char, color: Color) {
        let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            self.plot(
                from.0 + (to.0 - from.0) * t,
                from.1 + (to.1 - from.1) * t,
                from.2 + (to.2 - from.2) * t,
                character,
                color,
            );
        }
    }

    /// Grid lines are sampled in world space: long lines routinely leave the
    /// view on one end.
    fn draw_grid_line(
        &mut self,
        mvp: &Matrix4<f32>,
        camera: &Camera,
        from: Point3<f32>,
        to: Point3<f32>,
        color: Color,
    ) {
        for sample in 0..=GRID_SAMPLES {
            let t = sample as f32 / GRID_SAMPLES as f32;
            let point = from + (to - from) * t;
            if let Some((x, y, depth)) =
                camera.project_with(mvp, &point, self.width as u32, self.height as u32)
            {
                self.plot(x, y, depth + GRID_DEPTH_BIAS, GRID_CHAR, color);
            }
        }
    }

    fn plot(&mut self, x: f32, y: f32, depth: f32, character: char, color: Color) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return;
        }

        let idx = y * self.width + x;
        if depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.char_buffer[idx] = character;
            self.color_buffer[idx] = color;
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.queue(SetBackgroundColor(self.background.color()))?;
        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            let mut current = None;
            for x in 0..self.width {
                let idx = y * self.width + x;
                let color = self.color_buffer[idx];
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(self.char_buffer[idx]))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn ramp(brightness: f32) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    let index = (brightness.clamp(0.0, 1.0) * last as f32) as usize;
    // never blank: a lit face must stay visible
    LUMINOSITY_RAMP[index.clamp(1, last)]
}

fn shade(material: &Material, brightness: f32) -> Color {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * brightness.clamp(0.0, 1.0) * 255.0) as u8;
    let [r, g, b, _] = material.base_color;
    Color::Rgb {
        r: channel(r),
        g: channel(g),
        b: channel(b),
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

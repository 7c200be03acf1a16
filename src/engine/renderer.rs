use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WebGlBuffer, WebGlProgram, WebGlRenderingContext, WebGlUniformLocation};
use nalgebra::{Matrix4, Vector3};
use crate::engine::mesh::{Mesh, STRIDE};

const VERTEX_SHADER: &str = r#"
    attribute vec3 aPosition;
    attribute vec3 aColor;
    uniform mat4 uProjection;
    uniform mat4 uModelView;
    varying vec3 vColor;
    varying vec3 vViewPos;
    void main() {
        vec4 viewPos = uModelView * vec4(aPosition, 1.0);
        gl_Position = uProjection * viewPos;
        vViewPos = viewPos.xyz;
        vColor = aColor;
    }
"#;

const FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    varying vec3 vColor;
    varying vec3 vViewPos;
    uniform vec3 uTint;
    uniform float uTintAmount;
    uniform float uAmbient;
    uniform float uHeadlight;
    uniform vec3 uFogColor;
    uniform float uFogNear;
    uniform float uFogFar;

    void main() {
        vec3 color = mix(vColor, uTint, uTintAmount);

        // Cone of light ahead of the eye, falling off with distance
        float depth = -vViewPos.z;
        float cone = smoothstep(0.55, 0.95, normalize(-vViewPos).z);
        float reach = clamp(1.0 - depth / 90.0, 0.0, 1.0);
        color *= uAmbient + uHeadlight * cone * reach;

        float fog = smoothstep(uFogNear, uFogFar, length(vViewPos));
        gl_FragColor = vec4(mix(color, uFogColor, fog), 1.0);
    }
"#;

/// Night palette and lighting shared by every draw in a frame.
#[derive(Clone, Copy, Debug)]
pub struct Atmosphere {
    pub sky: [f32; 3],
    pub ambient: f32,
    pub headlight: f32,
    pub fog_near: f32,
    pub fog_far: f32,
}

impl Default for Atmosphere {
    fn default() -> Self {
        Atmosphere {
            sky: [0.02, 0.03, 0.07],
            ambient: 0.35,
            headlight: 0.8,
            fog_near: 60.0,
            fog_far: 320.0,
        }
    }
}

/// A mesh uploaded once and drawn many times.
pub struct GpuMesh {
    vertex_buffer: WebGlBuffer,
    index_buffer: WebGlBuffer,
    index_count: i32,
}

struct Uniforms {
    projection: WebGlUniformLocation,
    model_view: WebGlUniformLocation,
    tint: WebGlUniformLocation,
    tint_amount: WebGlUniformLocation,
    ambient: WebGlUniformLocation,
    headlight: WebGlUniformLocation,
    fog_color: WebGlUniformLocation,
    fog_near: WebGlUniformLocation,
    fog_far: WebGlUniformLocation,
}

pub struct Renderer {
    pub gl: WebGlRenderingContext,
    uniforms: Uniforms,
    position_location: u32,
    color_location: u32,
    unit_cube: GpuMesh,
}

fn uniform(gl: &WebGlRenderingContext, program: &WebGlProgram, name: &str) -> Result<WebGlUniformLocation, JsValue> {
    gl.get_uniform_location(program, name)
        .ok_or_else(|| JsValue::from_str(&format!("Failed to get {} location", name)))
}

fn attribute(gl: &WebGlRenderingContext, program: &WebGlProgram, name: &str) -> Result<u32, JsValue> {
    let location = gl.get_attrib_location(program, name);
    if location < 0 {
        return Err(JsValue::from_str(&format!("Failed to get {} location", name)));
    }
    Ok(location as u32)
}

impl Renderer {
    pub fn new(gl: WebGlRenderingContext) -> Result<Self, JsValue> {
        let program = create_program(&gl)?;
        gl.use_program(Some(&program));

        let uniforms = Uniforms {
            projection: uniform(&gl, &program, "uProjection")?,
            model_view: uniform(&gl, &program, "uModelView")?,
            tint: uniform(&gl, &program, "uTint")?,
            tint_amount: uniform(&gl, &program, "uTintAmount")?,
            ambient: uniform(&gl, &program, "uAmbient")?,
            headlight: uniform(&gl, &program, "uHeadlight")?,
            fog_color: uniform(&gl, &program, "uFogColor")?,
            fog_near: uniform(&gl, &program, "uFogNear")?,
            fog_far: uniform(&gl, &program, "uFogFar")?,
        };
        let position_location = attribute(&gl, &program, "aPosition")?;
        let color_location = attribute(&gl, &program, "aColor")?;

        let unit_cube = upload(&gl, &Mesh::cube(1.0, 1.0, 1.0, 1.0))?;

        gl.enable(WebGlRenderingContext::DEPTH_TEST);

        let renderer = Renderer {
            gl,
            uniforms,
            position_location,
            color_location,
            unit_cube,
        };
        renderer.set_atmosphere(&Atmosphere::default());
        Ok(renderer)
    }

    pub fn upload(&self, mesh: &Mesh) -> Result<GpuMesh, JsValue> {
        upload(&self.gl, mesh)
    }

    pub fn clear(&self, r: f32, g: f32, b: f32) {
        self.gl.clear_color(r, g, b, 1.0);
        self.gl.clear(WebGlRenderingContext::COLOR_BUFFER_BIT | WebGlRenderingContext::DEPTH_BUFFER_BIT);
    }

    pub fn set_atmosphere(&self, atmosphere: &Atmosphere) {
        let [r, g, b] = atmosphere.sky;
        self.gl.uniform3f(Some(&self.uniforms.fog_color), r, g, b);
        self.gl.uniform1f(Some(&self.uniforms.fog_near), atmosphere.fog_near);
        self.gl.uniform1f(Some(&self.uniforms.fog_far), atmosphere.fog_far);
        self.gl.uniform1f(Some(&self.uniforms.ambient), atmosphere.ambient);
        self.gl.uniform1f(Some(&self.uniforms.headlight), atmosphere.headlight);
    }

    pub fn set_projection(&self, projection: &Matrix4<f32>) {
        self.gl.uniform_matrix4fv_with_f32_array(Some(&self.uniforms.projection), false, projection.as_slice());
    }

    pub fn resize(&self, width: i32, height: i32) {
        self.gl.viewport(0, 0, width, height);
    }

    pub fn canvas(&self) -> Option<HtmlCanvasElement> {
        self.gl.canvas()?.dyn_into::<HtmlCanvasElement>().ok()
    }

    /// Solid-coloured box, `(x, y, z)` at its centre.
    pub fn draw_cube(&self, x: f32, y: f32, z: f32, w: f32, h: f32, d: f32, r: f32, g: f32, b: f32, view: &Matrix4<f32>) {
        let model = Matrix4::new_translation(&Vector3::new(x, y, z)) *
                    Matrix4::new_nonuniform_scaling(&Vector3::new(w, h, d));
        self.draw(&self.unit_cube, &(view * model), Some(([r, g, b], 1.0)));
    }

    /// Draws a template with its own vertex colours, optionally blended
    /// toward `tint` by `amount`.
    pub fn draw_mesh(&self, mesh: &GpuMesh, model: &Matrix4<f32>, view: &Matrix4<f32>, tint: Option<([f32; 3], f32)>) {
        self.draw(mesh, &(view * model), tint);
    }

    fn draw(&self, mesh: &GpuMesh, model_view: &Matrix4<f32>, tint: Option<([f32; 3], f32)>) {
        let gl = &self.gl;
        gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&mesh.vertex_buffer));
        gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, Some(&mesh.index_buffer));

        let stride = (STRIDE * 4) as i32;
        gl.vertex_attrib_pointer_with_i32(self.position_location, 3, WebGlRenderingContext::FLOAT, false, stride, 0);
        gl.enable_vertex_attrib_array(self.position_location);
        gl.vertex_attrib_pointer_with_i32(self.color_location, 3, WebGlRenderingContext::FLOAT, false, stride, 12);
        gl.enable_vertex_attrib_array(self.color_location);

        let ([r, g, b], amount) = tint.unwrap_or(([0.0, 0.0, 0.0], 0.0));
        gl.uniform3f(Some(&self.uniforms.tint), r, g, b);
        gl.uniform1f(Some(&self.uniforms.tint_amount), amount);
        gl.uniform_matrix4fv_with_f32_array(Some(&self.uniforms.model_view), false, model_view.as_slice());

        gl.draw_elements_with_i32(
            WebGlRenderingContext::TRIANGLES,
            mesh.index_count,
            WebGlRenderingContext::UNSIGNED_SHORT,
            0
        );
    }
}

fn upload(gl: &WebGlRenderingContext, mesh: &Mesh) -> Result<GpuMesh, JsValue> {
    let vertex_buffer = gl.create_buffer().ok_or("Failed to create buffer")?;
    let index_buffer = gl.create_buffer().ok_or("Failed to create buffer")?;

    gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&vertex_buffer));
    unsafe {
        let vert_array = js_sys::Float32Array::view(&mesh.vertices);
        gl.buffer_data_with_array_buffer_view(
            WebGlRenderingContext::ARRAY_BUFFER,
            &vert_array,
            WebGlRenderingContext::STATIC_DRAW
        );
    }

    gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
    unsafe {
        let idx_array = js_sys::Uint16Array::view(&mesh.indices);
        gl.buffer_data_with_array_buffer_view(
            WebGlRenderingContext::ELEMENT_ARRAY_BUFFER,
            &idx_array,
            WebGlRenderingContext::STATIC_DRAW
        );
    }

    Ok(GpuMesh { vertex_buffer, index_buffer, index_count: mesh.indices.len() as i32 })
}

fn create_program(gl: &WebGlRenderingContext) -> Result<WebGlProgram, JsValue> {
    let vert_shader = compile_shader(gl, WebGlRenderingContext::VERTEX_SHADER, VERTEX_SHADER)?;
    let frag_shader = compile_shader(gl, WebGlRenderingContext::FRAGMENT_SHADER, FRAGMENT_SHADER)?;

    let program = gl.create_program().ok_or("Unable to create program")?;
    gl.attach_shader(&program, &vert_shader);
    gl.attach_shader(&program, &frag_shader);
    gl.link_program(&program);

    if gl.get_program_parameter(&program, WebGlRenderingContext::LINK_STATUS).as_bool().unwrap_or(false) {
        Ok(program)
    } else {
        Err(JsValue::from_str(&gl.get_program_info_log(&program).unwrap_or_default()))
    }
}

fn compile_shader(gl: &WebGlRenderingContext, shader_type: u32, source: &str) -> Result<web_sys::WebGlShader, JsValue> {
    let shader = gl.create_shader(shader_type).ok_or("Unable to create shader")?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl.get_shader_parameter(&shader, WebGlRenderingContext::COMPILE_STATUS).as_bool().unwrap_or(false) {
        Ok(shader)
    } else {
        Err(JsValue::from_str(&gl.get_shader_info_log(&shader).unwrap_or_default()))
    }
}

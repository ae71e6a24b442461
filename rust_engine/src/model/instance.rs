//! 模型实例：源模型的一份可动画副本

use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;

use crate::config;
use crate::skeleton::{Armature, Bone};
use crate::skinning::{self, SkinningInput, SkinningStats};
use crate::{ModelError, Result};

use super::{BoneIndex, Model, ObjMesh};

/// 模型实例
///
/// 持有源网格的私有可变副本；每次 [`ModelInstance::update_transforms`]
/// 都会重写其中的顶点位置与面法线，拓扑不变。
pub struct ModelInstance {
    root: Arc<Model>,
    model: ObjMesh,
    armatures: Vec<Armature>,
    armature_map: HashMap<String, usize>,
    /// 权重中的骨骼索引 -> 蒙皮矩阵槽位
    bones: HashMap<BoneIndex, usize>,
    /// 蒙皮矩阵缓冲区，槽位顺序与 bone_slots 一致
    skinning_matrices: Vec<Mat4>,
    bone_slots: Vec<BoneIndex>,
    first_update_logged: bool,
    missing_bones_logged: bool,
}

impl ModelInstance {
    pub fn new(root: Arc<Model>) -> Result<Self> {
        let mut instance = Self {
            root,
            model: ObjMesh::new(),
            armatures: Vec::new(),
            armature_map: HashMap::new(),
            bones: HashMap::new(),
            skinning_matrices: Vec::new(),
            bone_slots: Vec::new(),
            first_update_logged: false,
            missing_bones_logged: false,
        };
        instance.load()?;
        Ok(instance)
    }

    /// 从源模型重新构建网格副本与骨架
    ///
    /// 新的骨架列表全部构建成功后才替换旧状态；失败时实例保持原样。
    pub fn load(&mut self) -> Result<()> {
        let model = self.root.obj.clone();

        let mut armatures = Vec::with_capacity(model.armatures.len());
        let mut bones = HashMap::new();
        let mut bone_slots = Vec::new();
        for (armature_index, template) in model.armatures.iter().enumerate() {
            let armature = Armature::load(armature_index, template, &self.root.actions)?;
            for bone_index in 0..armature.bone_count() {
                let key = BoneIndex::new(armature_index, bone_index);
                bones.insert(key, bone_slots.len());
                bone_slots.push(key);
            }
            armatures.push(armature);
        }

        let armature_map = armatures
            .iter()
            .enumerate()
            .map(|(i, armature)| (armature.name.clone(), i))
            .collect();

        log::info!(
            "模型实例加载完成 '{}': {} 个顶点, {} 个面, {} 个骨架, {} 根骨骼",
            self.root.name,
            model.num_vertices(),
            model.num_faces(),
            armatures.len(),
            bone_slots.len()
        );

        self.model = model;
        self.armatures = armatures;
        self.armature_map = armature_map;
        self.skinning_matrices = vec![Mat4::IDENTITY; bone_slots.len()];
        self.bones = bones;
        self.bone_slots = bone_slots;
        Ok(())
    }

    /// 完整更新：骨骼矩阵 -> 蒙皮 -> 面法线
    pub fn update_transforms(&mut self) -> SkinningStats {
        // 1. 骨骼矩阵（每个骨架自根向下）
        for armature in &mut self.armatures {
            armature.update_bones();
        }
        for (slot, key) in self.bone_slots.iter().enumerate() {
            self.skinning_matrices[slot] = self.armatures[key.armature].bones()[key.bone].final_matrix();
        }

        // 2. 蒙皮（读源模型，写副本）
        let config = config::get_config();
        let source = &self.root.obj;
        let input = SkinningInput {
            positions: &source.vertices,
            weights: &source.weights,
        };
        let bones = &self.bones;
        let matrices = &self.skinning_matrices;
        let resolve = |key: BoneIndex| bones.get(&key).map(|&slot| matrices[slot]);
        let skinned_vertices = skinning::skin_vertices(
            &input,
            &mut self.model.vertices,
            &resolve,
            config.use_parallel(source.num_vertices()),
        );

        if !self.missing_bones_logged {
            self.missing_bones_logged = true;
            let missing = source
                .weights
                .iter()
                .flatten()
                .flat_map(|weights| weights.iter())
                .filter(|(key, _)| !bones.contains_key(key))
                .count();
            if missing > 0 {
                log::warn!(
                    "模型 '{}' 有 {} 条权重引用了不存在的骨骼，已跳过",
                    self.root.name,
                    missing
                );
            }
        }

        // 3. 面法线（顺序执行，共享法线槽按面顺序覆盖）
        let updated_faces = skinning::recompute_face_normals(&mut self.model);

        let stats = SkinningStats {
            skinned_vertices,
            updated_faces,
        };
        if !self.first_update_logged {
            self.first_update_logged = true;
            log::info!(
                "'{}' 首次变换更新: {} 个顶点蒙皮, {} 个面法线",
                self.root.name,
                stats.skinned_vertices,
                stats.updated_faces
            );
        } else if config.debug_log {
            log::debug!(
                "'{}' 变换更新: {} 个顶点蒙皮, {} 个面法线",
                self.root.name,
                stats.skinned_vertices,
                stats.updated_faces
            );
        }
        stats
    }

    // ========== 查询 ==========

    pub fn root(&self) -> &Arc<Model> {
        &self.root
    }

    /// 变形后的网格
    pub fn model(&self) -> &ObjMesh {
        &self.model
    }

    pub fn armatures(&self) -> &[Armature] {
        &self.armatures
    }

    pub fn armature(&self, name: &str) -> Option<&Armature> {
        self.armature_map.get(name).map(|&i| &self.armatures[i])
    }

    pub fn armature_mut(&mut self, name: &str) -> Option<&mut Armature> {
        let index = *self.armature_map.get(name)?;
        self.armatures.get_mut(index)
    }

    pub fn armature_checked(&self, name: &str) -> Result<&Armature> {
        self.armature(name)
            .ok_or_else(|| ModelError::ArmatureNotFound(name.to_string()))
    }

    pub fn armature_at(&self, index: usize) -> Option<&Armature> {
        self.armatures.get(index)
    }

    pub fn armature_at_mut(&mut self, index: usize) -> Option<&mut Armature> {
        self.armatures.get_mut(index)
    }

    /// 按权重使用的复合索引查找骨骼
    pub fn bone(&self, index: BoneIndex) -> Option<&Bone> {
        if !self.bones.contains_key(&index) {
            return None;
        }
        self.armatures.get(index.armature)?.bone_at(index.bone)
    }

    /// 渲染用平铺位置缓冲区
    pub fn positions_raw(&self) -> Vec<f32> {
        self.model.positions_raw()
    }

    /// 渲染用平铺法线缓冲区
    pub fn normals_raw(&self) -> Vec<f32> {
        self.model.normals_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{ActObject, Action, ActionLibrary, Keyframe, KeyframeCurve};
    use crate::model::{ObjBone, ObjFace};
    use glam::{Quat, Vec3};

    const EPSILON: f32 = 1e-5;

    /// 两根并列的根骨骼 A / B，四个顶点：
    /// 0 -> A，1 -> A/B 各半，2 -> 权重和为 0，3 -> 无权重
    fn fixture() -> Arc<Model> {
        let mut mesh = ObjMesh::new();
        mesh.add_armature("Rig");
        mesh.add_bone(ObjBone::new(None, "A", Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY, 1.0));
        mesh.add_bone(ObjBone::new(None, "B", Vec3::new(-1.0, 0.0, 0.0), Quat::IDENTITY, 1.0));

        mesh.add_vertex(Vec3::new(0.0, 0.0, 0.0));
        mesh.add_weight(BoneIndex::new(0, 0), 1.0);
        mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0));
        mesh.add_weight(BoneIndex::new(0, 0), 0.5);
        mesh.add_weight(BoneIndex::new(0, 1), 0.5);
        mesh.add_vertex(Vec3::new(0.0, 1.0, 0.0));
        mesh.add_weight(BoneIndex::new(0, 0), 0.0);
        mesh.add_vertex(Vec3::new(0.0, 0.0, 1.0));

        mesh.add_normal(Vec3::ZERO);
        mesh.add_face(ObjFace::new(vec![0, 1, 2]).with_normals(vec![0, 0, 0]));

        let mut action = Action::new("slide");
        action.add_channel(
            "A.tx",
            KeyframeCurve::from_keyframes([Keyframe::new(0.0, 0.0), Keyframe::new(10.0, 2.0)]),
        );
        let mut object = ActObject::new("Rig");
        object.insert_action(action);
        let mut actions = ActionLibrary::new();
        actions.insert_object(object);

        Arc::new(Model::new("fixture", mesh, actions))
    }

    #[test]
    fn test_load_indexes_bones() {
        let instance = ModelInstance::new(fixture()).unwrap();
        assert_eq!(instance.armatures().len(), 1);
        assert_eq!(instance.bone(BoneIndex::new(0, 1)).unwrap().name(), "B");
        assert!(instance.bone(BoneIndex::new(0, 2)).is_none());
        assert!(instance.bone(BoneIndex::new(1, 0)).is_none());
        assert!(instance.armature("Rig").is_some());
        assert!(instance.armature_checked("Other").is_err());
    }

    #[test]
    fn test_bind_pose_leaves_vertices_unchanged() {
        let root = fixture();
        let mut instance = ModelInstance::new(root.clone()).unwrap();
        let stats = instance.update_transforms();

        assert_eq!(stats.skinned_vertices, 2);
        for (skinned, original) in instance.model().vertices.iter().zip(&root.obj.vertices) {
            assert!((*skinned - *original).length() < EPSILON);
        }
    }

    #[test]
    fn test_animated_pose_moves_weighted_vertices() {
        let mut instance = ModelInstance::new(fixture()).unwrap();
        let rig = instance.armature_mut("Rig").unwrap();
        rig.start_action("slide");
        rig.seek_frame(5.0);
        instance.update_transforms();

        let vertices = &instance.model().vertices;
        // 顶点 0 完全跟随 A（+1 x）
        assert!((vertices[0] - Vec3::new(1.0, 0.0, 0.0)).length() < EPSILON);
        // 顶点 1 A/B 各半
        assert!((vertices[1] - Vec3::new(1.5, 0.0, 0.0)).length() < EPSILON);
        // 权重和为 0 / 无权重：保持原值
        assert_eq!(vertices[2], Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(vertices[3], Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_weights_resolve_by_armature_and_bone() {
        let mut mesh = ObjMesh::new();
        mesh.add_armature("Left");
        mesh.add_bone(ObjBone::new(None, "L", Vec3::ZERO, Quat::IDENTITY, 1.0));
        mesh.add_armature("Right");
        mesh.add_bone(ObjBone::new(None, "R", Vec3::ZERO, Quat::IDENTITY, 1.0));

        mesh.add_vertex(Vec3::ONE);
        mesh.add_weight(BoneIndex::new(0, 0), 1.0);
        mesh.add_vertex(Vec3::ONE);
        mesh.add_weight(BoneIndex::new(1, 0), 1.0);

        let mut instance = ModelInstance::new(Arc::new(Model::from_mesh("pair", mesh))).unwrap();
        assert_eq!(instance.bone(BoneIndex::new(1, 0)).unwrap().name(), "R");
        instance.armature_mut("Left").unwrap().bone_mut("L").unwrap().translation =
            Vec3::new(5.0, 0.0, 0.0);
        instance.armature_mut("Right").unwrap().bone_mut("R").unwrap().translation =
            Vec3::new(0.0, 0.0, 3.0);
        instance.update_transforms();

        let vertices = &instance.model().vertices;
        assert!((vertices[0] - Vec3::new(6.0, 1.0, 1.0)).length() < EPSILON);
        assert!((vertices[1] - Vec3::new(1.0, 1.0, 4.0)).length() < EPSILON);
    }

    #[test]
    fn test_normals_follow_skinned_positions() {
        let mut mesh = ObjMesh::new();
        mesh.add_armature("Rig");
        mesh.add_bone(ObjBone::new(None, "R", Vec3::ZERO, Quat::IDENTITY, 1.0));
        for v in [Vec3::ZERO, Vec3::X, Vec3::Y] {
            mesh.add_vertex(v);
            mesh.add_weight(BoneIndex::new(0, 0), 1.0);
        }
        mesh.add_normal(Vec3::ZERO);
        mesh.add_face(ObjFace::new(vec![0, 1, 2]).with_normals(vec![0, 0, 0]));

        let mut instance = ModelInstance::new(Arc::new(Model::from_mesh("tri", mesh))).unwrap();
        instance.update_transforms();
        assert!((instance.model().normals[0] - Vec3::Z).length() < EPSILON);

        // 绕 X 轴转 90 度：+Z 法线转到 -Y
        instance.armature_mut("Rig").unwrap().bone_mut("R").unwrap().rotation =
            Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        instance.update_transforms();
        assert!((instance.model().vertices[2] - Vec3::Z).length() < EPSILON);
        assert!((instance.model().normals[0] - Vec3::NEG_Y).length() < EPSILON);
    }

    /// 收集日志记录，按模型名过滤
    struct CaptureLogger;

    static CAPTURED: once_cell::sync::Lazy<std::sync::Mutex<Vec<(log::Level, String)>>> =
        once_cell::sync::Lazy::new(|| std::sync::Mutex::new(Vec::new()));

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            CAPTURED
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    #[test]
    fn test_per_frame_log_is_debug_level() {
        static LOGGER: CaptureLogger = CaptureLogger;
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);

        let mut mesh = ObjMesh::new();
        mesh.add_vertex(Vec3::ZERO);
        let mut instance =
            ModelInstance::new(Arc::new(Model::from_mesh("log-level-check", mesh))).unwrap();
        config::set_config(config::EngineConfig {
            debug_log: true,
            ..config::EngineConfig::default()
        });
        for _ in 0..3 {
            instance.update_transforms();
        }
        config::reset_config();

        let updates: Vec<log::Level> = CAPTURED
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, message)| message.contains("'log-level-check'") && message.contains("变换更新"))
            .map(|(level, _)| *level)
            .collect();
        assert_eq!(
            updates,
            vec![log::Level::Info, log::Level::Debug, log::Level::Debug]
        );
    }

    #[test]
    fn test_source_model_is_never_mutated() {
        let root = fixture();
        let before = root.obj.clone();
        let mut instance = ModelInstance::new(root.clone()).unwrap();
        instance.armature_mut("Rig").unwrap().bone_mut("B").unwrap().translation = Vec3::Y;
        instance.update_transforms();
        assert_eq!(root.obj, before);
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut instance = ModelInstance::new(fixture()).unwrap();
        instance.armature_mut("Rig").unwrap().bone_mut("A").unwrap().rotation =
            Quat::from_rotation_y(0.7);

        instance.update_transforms();
        let first = (instance.positions_raw(), instance.normals_raw());
        instance.update_transforms();
        let second = (instance.positions_raw(), instance.normals_raw());
        assert_eq!(first, second);
    }

    #[test]
    fn test_reload_restores_source_state() {
        let root = fixture();
        let mut instance = ModelInstance::new(root.clone()).unwrap();
        instance.armature_mut("Rig").unwrap().bone_mut("A").unwrap().translation = Vec3::Z;
        instance.update_transforms();
        assert_ne!(instance.model().vertices, root.obj.vertices);

        instance.load().unwrap();
        assert_eq!(instance.model(), &root.obj);
        assert_eq!(
            instance.armature("Rig").unwrap().bone("A").unwrap().translation,
            Vec3::ZERO
        );
    }

    #[test]
    fn test_forward_parent_fails_load() {
        let mut mesh = ObjMesh::new();
        mesh.add_armature("Broken");
        mesh.add_bone(ObjBone::new(Some(3), "x", Vec3::ZERO, Quat::IDENTITY, 1.0));
        let result = ModelInstance::new(Arc::new(Model::from_mesh("broken", mesh)));
        assert!(matches!(result, Err(ModelError::InvalidBoneParent { .. })));
    }
}
